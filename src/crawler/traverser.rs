//! Crawl traversal
//!
//! Walks hyperlinks outward from a seed page using an explicit frontier. Each
//! expansion fetches a page, checks for a 200, and extracts its links. Newly
//! discovered links go into the [`VisitedSet`] and, when depth allows, onto the
//! frontier. Failures are recorded as run events and end only their own branch.

use crate::config::Config;
use crate::crawler::fetcher::{fetch_html, PageError};
use crate::crawler::parser::extract_links;
use crate::crawler::visited::{Insertion, VisitedSet};
use crate::output::{emit, EventRecorder, RunEvent, Stage};
use crate::url::LinkPolicy;
use futures::FutureExt;
use reqwest::Client;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A page waiting on the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedPage {
    /// The page to expand
    pub url: Url,

    /// Link distance from the seed (the seed is 0)
    pub depth: u32,
}

/// Options controlling one traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalOptions {
    /// Expand discovered links, not just the seed
    pub recurse: bool,

    /// Deepest link distance that is still expanded
    pub max_depth: Option<u32>,

    /// Visited set capacity
    pub max_pages: Option<usize>,

    /// How hrefs are resolved against their page
    pub link_policy: LinkPolicy,

    /// Expansions allowed in flight at once
    pub max_concurrent_pages: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            recurse: false,
            max_depth: None,
            max_pages: None,
            link_policy: LinkPolicy::Strict,
            max_concurrent_pages: 1,
        }
    }
}

impl TraversalOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recurse: config.crawl.recurse,
            max_depth: config.crawl.max_depth,
            max_pages: config.crawl.max_pages,
            link_policy: LinkPolicy::from_legacy_flag(config.crawl.legacy_url_repair),
            max_concurrent_pages: config.concurrency.max_concurrent_pages,
        }
    }

    /// Whether a discovered link at `depth` gets expanded
    pub fn may_expand(&self, depth: u32) -> bool {
        self.recurse && self.max_depth.map_or(true, |max| depth <= max)
    }
}

/// Outcome of one traversal
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Every URL discovered
    pub visited: VisitedSet,

    /// Pages fetched with a 200 and scanned for links
    pub pages_expanded: usize,

    /// Expansions that ended in a failure event
    pub failures: usize,

    /// The traversal was stopped by its cancellation token
    pub cancelled: bool,
}

/// Concurrent, cancellable link traverser
pub struct Traverser {
    client: Client,
    options: TraversalOptions,
    recorder: Arc<dyn EventRecorder>,
    cancel: CancellationToken,
}

impl Traverser {
    /// Creates a new traverser
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `options` - Recursion, caps and concurrency
    /// * `recorder` - Receives a failure event for every page that cannot be expanded
    /// * `cancel` - Stops scheduling and aborts in-flight expansions when cancelled
    pub fn new(
        client: Client,
        options: TraversalOptions,
        recorder: Arc<dyn EventRecorder>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            options,
            recorder,
            cancel,
        }
    }

    /// Crawls outward from `seed`
    ///
    /// The seed is always expanded but is not itself added to the visited set; it
    /// only becomes a member if some page links back to it.
    pub async fn crawl(&self, seed: &Url) -> CrawlReport {
        let mut report = CrawlReport {
            visited: VisitedSet::with_limit(self.options.max_pages),
            ..CrawlReport::default()
        };

        let mut frontier = vec![QueuedPage {
            url: seed.clone(),
            depth: 0,
        }];
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_pages.max(1)));
        let mut in_flight: JoinSet<(QueuedPage, Result<Vec<String>, PageError>)> =
            JoinSet::new();

        tracing::info!("Crawling from {}", seed);

        loop {
            if self.cancel.is_cancelled() {
                in_flight.abort_all();
                report.cancelled = true;
                break;
            }

            if report.visited.is_full() && !frontier.is_empty() {
                tracing::info!(
                    "Page cap of {} reached, dropping {} queued pages",
                    report.visited.len(),
                    frontier.len()
                );
                frontier.clear();
            }

            while !frontier.is_empty() {
                let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                    break;
                };
                let Some(page) = frontier.pop() else {
                    break;
                };

                let client = self.client.clone();
                let policy = self.options.link_policy;
                in_flight.spawn(async move {
                    let _permit = permit;
                    let links = guarded(&page.url, expand(&client, &page.url, policy)).await;
                    (page, links)
                });
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    in_flight.abort_all();
                    report.cancelled = true;
                    break;
                }

                joined = in_flight.join_next() => match joined {
                    Some(Ok((page, Ok(links)))) => {
                        report.pages_expanded += 1;
                        self.discover(&page, links, &mut report.visited, &mut frontier);
                    }
                    Some(Ok((page, Err(e)))) => {
                        report.failures += 1;
                        emit(
                            self.recorder.as_ref(),
                            RunEvent::failure(Stage::Crawl, page.url.as_str(), e.kind(), e.to_string()),
                        );
                    }
                    Some(Err(e)) => {
                        report.failures += 1;
                        tracing::error!("Page expansion task failed: {}", e);
                    }
                    None => {}
                },
            }
        }

        if report.cancelled {
            tracing::warn!(
                "Crawl cancelled with {} URLs discovered",
                report.visited.len()
            );
        } else {
            tracing::info!(
                "Crawl finished: {} URLs discovered, {} pages expanded, {} failures",
                report.visited.len(),
                report.pages_expanded,
                report.failures
            );
        }

        report
    }

    /// Inserts the links of an expanded page and queues the expandable ones
    fn discover(
        &self,
        page: &QueuedPage,
        links: Vec<String>,
        visited: &mut VisitedSet,
        frontier: &mut Vec<QueuedPage>,
    ) {
        let depth = page.depth + 1;
        let mut children = Vec::new();

        for link in links {
            match visited.insert_if_absent(&link) {
                Insertion::Inserted => {
                    if !self.options.may_expand(depth) {
                        continue;
                    }
                    match Url::parse(&link) {
                        Ok(url) => children.push(QueuedPage { url, depth }),
                        Err(e) => tracing::debug!("Not expanding {}: {}", link, e),
                    }
                }
                Insertion::Full => break,
                Insertion::AlreadyPresent | Insertion::Rejected => {}
            }
        }

        tracing::debug!(
            "{} queued {} new pages at depth {}",
            page.url,
            children.len(),
            depth
        );

        // Reversed so the stack pops them in document order
        frontier.extend(children.into_iter().rev());
    }
}

/// Fetches one page and extracts its links
async fn expand(client: &Client, url: &Url, policy: LinkPolicy) -> Result<Vec<String>, PageError> {
    let html = fetch_html(client, url).await?;
    Ok(extract_links(&html, url, policy))
}

/// Awaits an expansion, turning a panic into a failure of its page
async fn guarded<F>(url: &Url, expansion: F) -> Result<Vec<String>, PageError>
where
    F: Future<Output = Result<Vec<String>, PageError>>,
{
    match AssertUnwindSafe(expansion).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(PageError::Panicked {
            url: url.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
