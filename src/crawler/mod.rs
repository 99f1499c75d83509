//! Crawler module for page fetching, traversal and pipeline coordination
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with redirect caps and failure classification
//! - HTML parsing for links and lazy-load image sources
//! - Concurrent, depth- and page-capped link traversal
//! - Overall crawl, harvest and download coordination

mod coordinator;
mod fetcher;
mod parser;
mod traverser;
mod visited;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, fetch, fetch_html, send, FetchError, FetchResponse, PageError,
};
pub use parser::{extract_links, harvest_images};
pub use traverser::{CrawlReport, QueuedPage, TraversalOptions, Traverser};
pub use visited::{Insertion, VisitedSet};
