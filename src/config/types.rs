use serde::Deserialize;

/// Seed page crawled when no `--url` or config value is given
pub const DEFAULT_SEED_URL: &str = "https://unsplash.com";

/// Output directory used when no `--out` or config value is given
pub const DEFAULT_OUT_DIR: &str = "downloaded";

/// Attribute carrying the deferred image source on lazily-loaded galleries
pub const DEFAULT_LAZY_SRC_ATTRIBUTE: &str = "data-src";

/// Main configuration structure for Image-Harvester
///
/// Every section is optional; an empty file (or no file at all) yields the same
/// defaults as the bare command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
    pub concurrency: ConcurrencyConfig,
    pub output: OutputConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// The page the crawl starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Follow discovered links transitively
    pub recurse: bool,

    /// Deepest link distance from the seed that is still expanded (unbounded if unset)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Maximum number of URLs the visited set may hold (unbounded if unset)
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Reproduce the historical repair of non-HTTP hrefs instead of discarding them
    #[serde(rename = "legacy-url-repair")]
    pub legacy_url_repair: bool,

    /// Image attribute harvested as the lazy-load source
    #[serde(rename = "lazy-src-attribute")]
    pub lazy_src_attribute: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            seed_url: DEFAULT_SEED_URL.to_string(),
            recurse: false,
            max_depth: None,
            max_pages: None,
            legacy_url_repair: false,
            lazy_src_attribute: DEFAULT_LAZY_SRC_ATTRIBUTE.to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Redirect hops followed before a fetch fails with too many redirects
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("ImageHarvester/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Worker pool sizes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Maximum number of page fetches in flight (crawl and harvest stages)
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: usize,

    /// Maximum number of image downloads in flight
    #[serde(rename = "max-concurrent-downloads")]
    pub max_concurrent_downloads: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 8,
            max_concurrent_downloads: 4,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory; images land in `<out-dir>/imgs`, run logs in `<out-dir>/log`
    #[serde(rename = "out-dir")]
    pub out_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: DEFAULT_OUT_DIR.to_string(),
        }
    }
}
