//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the harvester, including:
//! - Building the shared HTTP client (user agent, timeouts, redirect cap)
//! - GET requests returning the status and body of any HTTP response
//! - Classification of transport failures into redirect, HTTP and network errors
//!
//! The fetcher never logs failures as run events; that is the caller's job.

use crate::config::HttpConfig;
use crate::output::FailureKind;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Classified failure of a single fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The redirect chain exceeded the configured cap
    #[error("Too many redirects for URL {url}")]
    TooManyRedirects { url: String },

    /// The HTTP exchange itself was malformed or invalid
    #[error("HTTP error occurred {url}: {message}")]
    Http { url: String, message: String },

    /// DNS, connect, timeout or reset failures
    #[error("An error occurred {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    ///
    /// | reqwest condition | Classification |
    /// |-------------------|----------------|
    /// | redirect policy exceeded | `TooManyRedirects` |
    /// | builder / decode / status | `Http` |
    /// | timeout / connect / anything else | `Network` |
    pub fn classify(url: &str, error: &reqwest::Error) -> Self {
        let url = url.to_string();

        if error.is_redirect() {
            FetchError::TooManyRedirects { url }
        } else if error.is_builder() || error.is_decode() || error.is_status() {
            FetchError::Http {
                url,
                message: error.to_string(),
            }
        } else if error.is_timeout() {
            FetchError::Network {
                url,
                message: "Request timeout".to_string(),
            }
        } else {
            FetchError::Network {
                url,
                message: error.to_string(),
            }
        }
    }

    /// The failure kind written into run events
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::TooManyRedirects { .. } => FailureKind::TooManyRedirects,
            FetchError::Http { .. } => FailureKind::HttpError,
            FetchError::Network { .. } => FailureKind::NetworkError,
        }
    }
}

/// Failure to obtain an HTML page worth parsing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    /// The server answered with something other than 200
    #[error("Failed to fetch {url}. Status code: {status}")]
    Status { url: String, status: u16 },

    /// The request itself failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Fetching or parsing the page panicked
    #[error("Expanding {url} panicked: {message}")]
    Panicked { url: String, message: String },
}

impl PageError {
    /// The failure kind written into run events
    pub fn kind(&self) -> FailureKind {
        match self {
            PageError::Status { .. } => FailureKind::NonSuccessStatus,
            PageError::Fetch(e) => e.kind(),
            PageError::Panicked { .. } => FailureKind::Internal,
        }
    }
}

/// A complete HTTP response, whatever its status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Final URL after redirects
    pub final_url: Url,

    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true for a 200 response
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// Decodes the body as UTF-8, replacing invalid sequences
    ///
    /// Ignores any charset the server declared; pages go through [`fetch_html`].
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use image_harvester::config::HttpConfig;
/// use image_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a GET request and hands back the unread response
///
/// Used directly by the image downloader so the body can be streamed to disk.
pub async fn send(client: &Client, url: &Url) -> Result<Response, FetchError> {
    tracing::debug!("GET {}", url);

    client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| FetchError::classify(url.as_str(), &e))
}

/// Fetches a URL and returns its status and full body
///
/// Non-200 responses are NOT errors here; the caller decides what a 404 means.
pub async fn fetch(client: &Client, url: &Url) -> Result<FetchResponse, FetchError> {
    let response = send(client, url).await?;

    let status = response.status().as_u16();
    let final_url = response.url().clone();

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::classify(url.as_str(), &e))?;

    Ok(FetchResponse {
        status,
        final_url,
        body: body.to_vec(),
    })
}

/// Fetches an HTML page, treating every status other than 200 as a failure
///
/// The body is decoded with the charset from the `Content-Type` header,
/// falling back to UTF-8.
pub async fn fetch_html(client: &Client, url: &Url) -> Result<String, PageError> {
    let response = send(client, url).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(PageError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| FetchError::classify(url.as_str(), &e))?;

    Ok(html)
}
