//! Pipeline coordinator - main harvest orchestration logic
//!
//! This module runs one harvest from start to finish:
//! - Preparing the output directories and the run log
//! - Crawling outward from the seed page
//! - Harvesting lazy-load image sources from every discovered page
//! - Downloading each harvested image
//! - Tallying the run summary
//!
//! Each stage completes before the next begins. Individual failures are recorded
//! as run events; only setup failures are returned as errors.

use crate::config::{validate, Config};
use crate::crawler::fetcher::{build_http_client, fetch_html, PageError};
use crate::crawler::parser::harvest_images;
use crate::crawler::traverser::{TraversalOptions, Traverser};
use crate::download::{download_image, DownloadError, DownloadedImage};
use crate::output::{
    emit, EventRecorder, FailureKind, JsonLinesLog, RunEvent, RunLayout, RunSummary, Stage,
};
use crate::url::resolve_image_src;
use crate::HarvestError;
use chrono::Local;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    seed: Url,
    client: Client,
    layout: RunLayout,
    recorder: Arc<dyn EventRecorder>,
    cancel: CancellationToken,
    config_hash: Option<String>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Creates `<out>/imgs` and `<out>/log` if needed and opens this run's log file.
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or unusable output directory
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;

        let seed = Url::parse(&config.crawl.seed_url)?;
        let layout = RunLayout::prepare(Path::new(&config.output.out_dir), &Local::now())?;
        let log = JsonLinesLog::open(&layout.log_file)?;
        let client = build_http_client(&config.http)?;

        tracing::debug!("Run log: {}", layout.log_file.display());

        Ok(Self {
            config: Arc::new(config),
            seed,
            client,
            layout,
            recorder: Arc::new(log),
            cancel: CancellationToken::new(),
            config_hash: None,
        })
    }

    /// Tags the run start event with the hash of the config file in use
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Token that stops the run when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn layout(&self) -> &RunLayout {
        &self.layout
    }

    /// Runs crawl, harvest and download in order
    ///
    /// Cancellation is checked between stages and inside each of them; a cancelled
    /// run still records its finish event and returns what it tallied so far.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new();

        let started = match &self.config_hash {
            Some(hash) => format!("Run started (config {})", hash),
            None => "Run started".to_string(),
        };
        emit(
            self.recorder.as_ref(),
            RunEvent::success(Stage::Run, self.seed.as_str(), started),
        );

        let traverser = Traverser::new(
            self.client.clone(),
            TraversalOptions::from_config(&self.config),
            self.recorder.clone(),
            self.cancel.clone(),
        );
        let report = traverser.crawl(&self.seed).await;

        summary.pages_discovered = report.visited.len();
        summary.pages_expanded = report.pages_expanded;
        summary.crawl_failures = report.failures;

        if !self.cancel.is_cancelled() {
            let images = self
                .harvest_stage(report.visited.into_sorted_vec(), &mut summary)
                .await;

            if !self.cancel.is_cancelled() {
                self.download_stage(images, &mut summary).await;
            }
        }

        summary.cancelled = self.cancel.is_cancelled();

        let finished = if summary.cancelled {
            format!(
                "Run cancelled: {} images downloaded, {} failures",
                summary.images_downloaded,
                summary.total_failures()
            )
        } else {
            format!(
                "Run finished: {} images downloaded, {} failures",
                summary.images_downloaded,
                summary.total_failures()
            )
        };
        emit(
            self.recorder.as_ref(),
            RunEvent::success(Stage::Run, self.seed.as_str(), finished),
        );

        summary
    }

    /// Fetches every visited page and collects resolved image URLs in page order
    async fn harvest_stage(&self, pages: Vec<String>, summary: &mut RunSummary) -> Vec<Url> {
        tracing::info!("Harvesting images from {} pages", pages.len());

        let mut targets = Vec::with_capacity(pages.len());
        for page in pages {
            match Url::parse(&page) {
                Ok(url) => targets.push(url),
                Err(e) => {
                    summary.harvest_failures += 1;
                    emit(
                        self.recorder.as_ref(),
                        RunEvent::failure(
                            Stage::Harvest,
                            page.as_str(),
                            FailureKind::InvalidUrl,
                            format!("Cannot fetch page: {}", e),
                        ),
                    );
                }
            }
        }

        let fetched: Vec<(Url, Result<String, PageError>)> = stream::iter(targets)
            .map(|url| {
                let client = self.client.clone();
                async move {
                    let html = fetch_html(&client, &url).await;
                    (url, html)
                }
            })
            .buffered(self.config.concurrency.max_concurrent_pages.max(1))
            .take_until(self.cancel.cancelled())
            .collect()
            .await;

        let attribute = self.config.crawl.lazy_src_attribute.as_str();
        let mut images = Vec::new();

        for (page, html) in fetched {
            let html = match html {
                Ok(html) => html,
                Err(e) => {
                    summary.harvest_failures += 1;
                    emit(
                        self.recorder.as_ref(),
                        RunEvent::failure(Stage::Harvest, page.as_str(), e.kind(), e.to_string()),
                    );
                    continue;
                }
            };

            summary.pages_harvested += 1;
            let sources = harvest_images(&html, attribute);
            tracing::debug!("{} images with {} on {}", sources.len(), attribute, page);
            summary.images_found += sources.len();

            for src in sources {
                match resolve_image_src(&src, &page) {
                    Ok(url) => images.push(url),
                    Err(e) => {
                        summary.harvest_failures += 1;
                        emit(
                            self.recorder.as_ref(),
                            RunEvent::failure(
                                Stage::Harvest,
                                page.as_str(),
                                FailureKind::InvalidUrl,
                                format!("Unusable image source {:?}: {}", src, e),
                            ),
                        );
                    }
                }
            }
        }

        images
    }

    /// Downloads every image, at most `max-concurrent-downloads` at a time
    async fn download_stage(&self, images: Vec<Url>, summary: &mut RunSummary) {
        tracing::info!(
            "Downloading {} images into {}",
            images.len(),
            self.layout.images_dir.display()
        );

        let mut downloads = stream::iter(images)
            .map(|url| {
                let client = self.client.clone();
                let dir = self.layout.images_dir.clone();
                async move {
                    let result = download_image(&client, &url, &dir).await;
                    (url, result)
                }
            })
            .buffer_unordered(self.config.concurrency.max_concurrent_downloads.max(1))
            .take_until(self.cancel.cancelled());
        futures::pin_mut!(downloads);

        while let Some((url, result)) = downloads.next().await {
            self.record_download(&url, result, summary);
        }
    }

    fn record_download(
        &self,
        url: &Url,
        result: Result<DownloadedImage, DownloadError>,
        summary: &mut RunSummary,
    ) {
        match result {
            Ok(image) => {
                summary.images_downloaded += 1;
                summary.bytes_downloaded += image.bytes;
                emit(
                    self.recorder.as_ref(),
                    RunEvent::success(
                        Stage::Download,
                        url.as_str(),
                        format!("Saved {} ({} bytes)", image.path.display(), image.bytes),
                    ),
                );
            }
            Err(e) => {
                summary.download_failures += 1;
                emit(
                    self.recorder.as_ref(),
                    RunEvent::failure(Stage::Download, url.as_str(), e.kind(), e.to_string()),
                );
            }
        }
    }
}
