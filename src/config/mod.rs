//! Configuration module for Image-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional: command-line flags override whatever it sets,
//! and a missing file means defaults throughout.
//!
//! # Example
//!
//! ```no_run
//! use image_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Crawl starts at: {}", config.crawl.seed_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ConcurrencyConfig, Config, CrawlConfig, HttpConfig, OutputConfig, DEFAULT_LAZY_SRC_ATTRIBUTE,
    DEFAULT_OUT_DIR, DEFAULT_SEED_URL,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
