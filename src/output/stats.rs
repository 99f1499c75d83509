//! End-of-run tally
//!
//! Individual failures never abort a run; this summary is how they surface.

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs in the visited set
    pub pages_discovered: usize,

    /// Pages fetched and parsed for links during the crawl
    pub pages_expanded: usize,

    /// Crawl fetches that failed or returned a non-200 status
    pub crawl_failures: usize,

    /// Pages fetched and scanned for lazy-load images
    pub pages_harvested: usize,

    /// Harvest fetches that failed, plus image sources that could not be resolved
    pub harvest_failures: usize,

    /// Entries in the image source list
    pub images_found: usize,

    /// Images written to disk
    pub images_downloaded: usize,

    /// Downloads that failed
    pub download_failures: usize,

    /// Total bytes written to disk
    pub bytes_downloaded: u64,

    /// The run was stopped before completion
    pub cancelled: bool,
}

impl RunSummary {
    /// Creates a new empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures across all stages
    pub fn total_failures(&self) -> usize {
        self.crawl_failures + self.harvest_failures + self.download_failures
    }

    pub fn has_failures(&self) -> bool {
        self.total_failures() > 0
    }

    /// Share of found images that were downloaded, as a percentage
    pub fn download_success_rate(&self) -> f64 {
        if self.images_found == 0 {
            return 0.0;
        }
        (self.images_downloaded as f64 / self.images_found as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Crawl:");
    println!("  Pages discovered: {}", summary.pages_discovered);
    println!("  Pages expanded: {}", summary.pages_expanded);
    println!("  Failures: {}", summary.crawl_failures);
    println!();

    println!("Harvest:");
    println!("  Pages scanned: {}", summary.pages_harvested);
    println!("  Images found: {}", summary.images_found);
    println!("  Failures: {}", summary.harvest_failures);
    println!();

    println!("Download:");
    println!(
        "  Images downloaded: {} ({:.1}%)",
        summary.images_downloaded,
        summary.download_success_rate()
    );
    println!("  Bytes written: {}", summary.bytes_downloaded);
    println!("  Failures: {}", summary.download_failures);
    println!();

    if summary.cancelled {
        println!("Run was cancelled before completion.");
    }
    println!("Total failures: {}", summary.total_failures());
}
