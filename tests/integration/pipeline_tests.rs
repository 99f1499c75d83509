//! Full crawl → harvest → download runs against mock galleries

use image_harvester::config::{Config, HttpConfig};
use image_harvester::crawler::{build_http_client, harvest_images, Coordinator};
use image_harvester::download::download_image;
use image_harvester::output::{read_run_log, FailureKind, Outcome, Stage};
use std::path::Path;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(seed: &str, out_dir: &Path, recurse: bool) -> Config {
    let mut config = Config::default();
    config.crawl.seed_url = seed.to_string();
    config.crawl.recurse = recurse;
    config.output.out_dir = out_dir.display().to_string();
    config.http.timeout_secs = 10;
    config.concurrency.max_concurrent_pages = 2;
    config.concurrency.max_concurrent_downloads = 2;
    config
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, route: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(bytes),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_downloads_lazy_images() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<html><body>
            <a href="/gallery/one">One</a>
            <a href="/gallery/two">Two</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/gallery/one",
        &format!(
            r#"<html><body>
                <img data-src="{}/photos/sunset.jpg">
                <img src="/photos/eager.jpg">
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_html(
        &server,
        "/gallery/two",
        r#"<html><body><img data-src="../photos/forest.jpg"></body></html>"#,
    )
    .await;

    let sunset: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let forest: Vec<u8> = b"\xff\xd8\xff\xe0forest".to_vec();
    mount_image(&server, "/photos/sunset.jpg", sunset.clone()).await;
    mount_image(&server, "/photos/forest.jpg", forest.clone()).await;
    Mock::given(method("GET"))
        .and(path("/photos/eager.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("downloaded");
    let config = create_test_config(&format!("{}/", base), &out, false);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_discovered, 2);
    assert_eq!(summary.pages_harvested, 2);
    assert_eq!(summary.images_found, 2);
    assert_eq!(summary.images_downloaded, 2);
    assert_eq!(summary.bytes_downloaded, (sunset.len() + forest.len()) as u64);
    assert_eq!(summary.total_failures(), 0);
    assert!(!summary.cancelled);

    let images = out.join("imgs");
    assert_eq!(std::fs::read(images.join("sunset.jpg")).unwrap(), sunset);
    assert_eq!(std::fs::read(images.join("forest.jpg")).unwrap(), forest);
    assert!(!images.join("eager.jpg").exists());

    // No leftover partial files
    assert_eq!(std::fs::read_dir(&images).unwrap().count(), 2);
}

#[test]
fn test_only_lazy_sources_are_harvested() {
    let html = r#"<html><body>
        <img data-src="https://example.com/x.jpg">
        <img src="https://example.com/y.jpg">
    </body></html>"#;

    assert_eq!(
        harvest_images(html, "data-src"),
        vec!["https://example.com/x.jpg"]
    );
    // Harvesting the same page twice gives the same sequence
    assert_eq!(harvest_images(html, "data-src"), harvest_images(html, "data-src"));
}

#[tokio::test]
async fn test_missing_seed_completes_with_one_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path(), true);

    let coordinator = Coordinator::new(config).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_discovered, 0);
    assert_eq!(summary.crawl_failures, 1);
    assert_eq!(summary.total_failures(), 1);
    assert!(!summary.cancelled);

    let events = read_run_log(&coordinator.layout().log_file).unwrap();
    let failures: Vec<_> = events.iter().filter(|e| e.is_failure()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].stage, Stage::Crawl);
    assert_eq!(failures[0].kind, Some(FailureKind::NonSuccessStatus));

    // Run start and finish bracket the failure
    assert_eq!(events.first().map(|e| e.stage), Some(Stage::Run));
    assert_eq!(events.last().map(|e| e.stage), Some(Stage::Run));
}

#[tokio::test]
async fn test_same_basename_last_download_wins() {
    let server = MockServer::start().await;
    mount_image(&server, "/a/photo.jpg", b"first image".to_vec()).await;
    mount_image(&server, "/b/photo.jpg", b"second image".to_vec()).await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let first = Url::parse(&format!("{}/a/photo.jpg", server.uri())).unwrap();
    let second = Url::parse(&format!("{}/b/photo.jpg", server.uri())).unwrap();
    download_image(&client, &first, dir.path()).await.unwrap();
    let saved = download_image(&client, &second, dir.path()).await.unwrap();

    assert_eq!(saved.path, dir.path().join("photo.jpg"));
    assert_eq!(std::fs::read(&saved.path).unwrap(), b"second image");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_failures_are_logged_and_run_continues() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<a href="/ok">ok</a><a href="/gone">gone</a>"#,
    )
    .await;
    mount_html(
        &server,
        "/ok",
        r#"<img data-src="/img/fine.png"><img data-src="/img/missing.png"><img data-src="">"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    mount_image(&server, "/img/fine.png", vec![7; 128]).await;
    Mock::given(method("GET"))
        .and(path("/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&format!("{}/", base), dir.path(), false);

    let coordinator = Coordinator::new(config).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.pages_discovered, 2);
    assert_eq!(summary.pages_harvested, 1);
    assert_eq!(summary.images_found, 3);
    assert_eq!(summary.images_downloaded, 1);
    // /gone fails during harvest, as does the empty source
    assert_eq!(summary.harvest_failures, 2);
    assert_eq!(summary.download_failures, 1);

    let events = read_run_log(&coordinator.layout().log_file).unwrap();
    let downloads: Vec<_> = events
        .iter()
        .filter(|e| e.stage == Stage::Download)
        .collect();
    assert_eq!(downloads.len(), 2);
    assert!(downloads
        .iter()
        .any(|e| e.outcome == Outcome::Success && e.url.ends_with("/img/fine.png")));
    assert!(downloads.iter().any(|e| e.outcome == Outcome::Failure
        && e.kind == Some(FailureKind::NonSuccessStatus)));

    // Every line of the run log is one JSON record
    let raw = std::fs::read_to_string(&coordinator.layout().log_file).unwrap();
    assert_eq!(raw.lines().count(), events.len());
}

#[tokio::test]
async fn test_second_run_reuses_output_directory() {
    let server = MockServer::start().await;
    mount_html(&server, "/", r#"<a href="/p">p</a>"#).await;
    mount_html(&server, "/p", r#"<img data-src="/i/cat.gif">"#).await;
    mount_image(&server, "/i/cat.gif", b"GIF89a".to_vec()).await;

    let dir = tempfile::tempdir().unwrap();
    let seed = format!("{}/", server.uri());

    for _ in 0..2 {
        let coordinator = Coordinator::new(create_test_config(&seed, dir.path(), false)).unwrap();
        let summary = coordinator.run().await;
        assert_eq!(summary.images_downloaded, 1);
    }

    assert_eq!(
        std::fs::read(dir.path().join("imgs").join("cat.gif")).unwrap(),
        b"GIF89a"
    );
}
