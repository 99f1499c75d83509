//! Traversal behaviour against mock sites

use image_harvester::config::HttpConfig;
use image_harvester::crawler::{build_http_client, TraversalOptions, Traverser};
use image_harvester::output::{FailureKind, MemoryRecorder};
use image_harvester::LinkPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an HTML page with one anchor per href
fn html_with_links(links: &[&str]) -> String {
    let anchors: Vec<String> = links
        .iter()
        .map(|href| format!("<li><a href=\"{}\">{}</a></li>", href, href))
        .collect();
    format!(
        "<!DOCTYPE html><html><body><ul>{}</ul></body></html>",
        anchors.join("")
    )
}

async fn mount_page(server: &MockServer, route: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html_with_links(links)),
        )
        .mount(server)
        .await;
}

fn options(recurse: bool) -> TraversalOptions {
    TraversalOptions {
        recurse,
        max_depth: None,
        max_pages: None,
        link_policy: LinkPolicy::Strict,
        max_concurrent_pages: 4,
    }
}

fn traverser(options: TraversalOptions, recorder: Arc<MemoryRecorder>) -> Traverser {
    let http = HttpConfig {
        max_redirects: 3,
        timeout_secs: 10,
        ..HttpConfig::default()
    };
    let client = build_http_client(&http).expect("Failed to build client");
    Traverser::new(client, options, recorder, CancellationToken::new())
}

/// Counts GET requests the server received for one path
async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

#[tokio::test]
async fn test_non_recursive_crawl_collects_seed_links_only() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        &["https://example.com/a", "#section", "", "javascript:void(0)"],
    )
    .await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = traverser(options(false), recorder.clone())
        .crawl(&seed)
        .await;

    assert_eq!(report.visited.sorted(), vec!["https://example.com/a"]);
    assert_eq!(report.pages_expanded, 1);
    assert!(recorder.failures().is_empty());
}

#[tokio::test]
async fn test_recursive_crawl_reaches_acyclic_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/gallery", "/about"]).await;
    mount_page(&server, "/gallery", &["/gallery/1", "/gallery/2"]).await;
    mount_page(&server, "/about", &[]).await;
    mount_page(&server, "/gallery/1", &["/gallery/1/full"]).await;
    mount_page(&server, "/gallery/2", &[]).await;
    mount_page(&server, "/gallery/1/full", &[]).await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = traverser(options(true), recorder).crawl(&seed).await;

    let expected: Vec<String> = [
        "/about",
        "/gallery",
        "/gallery/1",
        "/gallery/1/full",
        "/gallery/2",
    ]
    .iter()
    .map(|p| format!("{}{}", server.uri(), p))
    .collect();

    assert_eq!(report.visited.sorted(), expected);
    assert_eq!(report.pages_expanded, 6);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_cycles_fetch_each_page_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a"]).await;
    mount_page(&server, "/a", &["/b", "/"]).await;
    mount_page(&server, "/b", &["/c", "/a"]).await;
    mount_page(&server, "/c", &["/a", "/b", "/"]).await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = traverser(options(true), recorder).crawl(&seed).await;

    assert_eq!(report.visited.len(), 4);
    assert_eq!(hits(&server, "/a").await, 1);
    assert_eq!(hits(&server, "/b").await, 1);
    assert_eq!(hits(&server, "/c").await, 1);
    // The seed is expanded once as the seed and once when linked back
    assert!(hits(&server, "/").await <= 2);
}

#[tokio::test]
async fn test_max_depth_limits_expansion() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/d1"]).await;
    mount_page(&server, "/d1", &["/d2"]).await;
    mount_page(&server, "/d2", &["/d3"]).await;
    mount_page(&server, "/d3", &["/d4"]).await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let capped = TraversalOptions {
        max_depth: Some(2),
        ..options(true)
    };
    let report = traverser(capped, recorder).crawl(&seed).await;

    assert_eq!(report.visited.len(), 3);
    assert!(report.visited.contains(&format!("{}/d3", server.uri())));
    assert!(!report.visited.contains(&format!("{}/d4", server.uri())));
    assert_eq!(hits(&server, "/d3").await, 0);
}

#[tokio::test]
async fn test_max_pages_limits_visited_set() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..20).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", &link_refs).await;
    for link in &links {
        mount_page(&server, link, &link_refs).await;
    }

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let capped = TraversalOptions {
        max_pages: Some(5),
        ..options(true)
    };
    let report = traverser(capped, recorder).crawl(&seed).await;

    assert_eq!(report.visited.len(), 5);
    assert!(report.pages_expanded <= 6);
}

#[tokio::test]
async fn test_redirect_loop_is_recorded_as_too_many_redirects() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/spin"]).await;
    Mock::given(method("GET"))
        .and(path("/spin"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/spin"))
        .mount(&server)
        .await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = traverser(options(true), recorder.clone())
        .crawl(&seed)
        .await;

    assert_eq!(report.failures, 1);
    let failures = recorder.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, Some(FailureKind::TooManyRedirects));
    assert!(failures[0].url.ends_with("/spin"));
}

#[tokio::test]
async fn test_latin1_page_links_keep_their_characters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><a href=\"/caf\xE9\">Caf\xE9</a></body></html>".to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&server)
        .await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = traverser(options(false), recorder).crawl(&seed).await;

    assert_eq!(
        report.visited.sorted(),
        vec![format!("{}/caf%C3%A9", server.uri())]
    );
}

#[tokio::test]
async fn test_depth_first_document_order_with_one_worker() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/a", "/b"]).await;
    mount_page(&server, "/a", &["/a1", "/a2"]).await;
    mount_page(&server, "/b", &["/b1"]).await;
    mount_page(&server, "/a1", &[]).await;
    mount_page(&server, "/a2", &[]).await;
    mount_page(&server, "/b1", &[]).await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let sequential = TraversalOptions {
        max_concurrent_pages: 1,
        ..options(true)
    };
    let report = traverser(sequential, recorder).crawl(&seed).await;

    let order: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();

    assert_eq!(order, vec!["/", "/a", "/a1", "/a2", "/b", "/b1"]);
    assert_eq!(report.pages_expanded, 6);
}

#[tokio::test]
async fn test_legacy_repair_keeps_non_http_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["mailto:someone@example.com"]).await;

    let recorder = Arc::new(MemoryRecorder::new());
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let legacy = TraversalOptions {
        link_policy: LinkPolicy::LegacyRepair,
        ..options(false)
    };
    let report = traverser(legacy, recorder).crawl(&seed).await;

    assert_eq!(
        report.visited.sorted(),
        vec![format!("{}/ailto:someone@example.com", server.uri())]
    );
}

#[tokio::test]
async fn test_cancellation_stops_crawl() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/slow"]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_with_links(&["/never"]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let cancel = CancellationToken::new();
    let recorder = Arc::new(MemoryRecorder::new());
    let traverser = Traverser::new(client, options(true), recorder, cancel.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
    });

    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let report = tokio::time::timeout(Duration::from_secs(10), traverser.crawl(&seed))
        .await
        .expect("crawl did not stop after cancellation");
    canceller.await.unwrap();

    assert!(report.cancelled);
    assert!(report.visited.contains(&format!("{}/slow", server.uri())));
    assert!(!report.visited.contains(&format!("{}/never", server.uri())));
}
