//! Image-Harvester: a lazy-load image gallery crawler
//!
//! This crate walks hyperlinks outward from a seed page, harvests lazily-loaded image
//! sources (`data-src` by default) from every discovered page, and downloads each image
//! into a local directory while keeping an append-only event log for the run.

pub mod config;
pub mod crawler;
pub mod download;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Image-Harvester operations
///
/// Only setup failures surface as a `HarvestError`. Per-page and per-image failures
/// are recorded as run events and never abort a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty URL")]
    Empty,

    #[error("URL has no file name: {0}")]
    NoFilename(String),
}

/// Result type alias for Image-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport, Traverser, VisitedSet};
pub use output::RunSummary;
pub use crate::url::{file_name_for, resolve_href, LinkPolicy};
