//! Image downloader
//!
//! Streams one image per call into the images directory. The file is named after
//! the final segment of the URL path; an existing file of the same name is
//! overwritten. Every filesystem step is checked, and a failed download leaves no
//! partial file behind.

mod partial;

use crate::crawler::{send, FetchError};
use crate::output::FailureKind;
use crate::url::file_name_for;
use crate::UrlError;
use partial::PartialFile;
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Classified failure of a single download
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No usable file name in the URL
    #[error(transparent)]
    Url(#[from] UrlError),

    /// The request failed before or while streaming the body
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The server answered with something other than 200
    #[error("Failed to download image [{url}]. Status code: {status}")]
    Status { url: String, status: u16 },

    /// Creating, writing or renaming the file failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DownloadError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// The failure kind written into run events
    pub fn kind(&self) -> FailureKind {
        match self {
            DownloadError::Url(_) => FailureKind::InvalidUrl,
            DownloadError::Fetch(e) => e.kind(),
            DownloadError::Status { .. } => FailureKind::NonSuccessStatus,
            DownloadError::Io { .. } => FailureKind::FilesystemError,
        }
    }
}

/// A successfully stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// Source URL
    pub url: String,

    /// Where the image was written
    pub path: PathBuf,

    /// Number of bytes written
    pub bytes: u64,
}

/// Downloads one image into `target_dir`
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Absolute image URL
/// * `target_dir` - Existing directory to write into
///
/// # Returns
///
/// * `Ok(DownloadedImage)` - The body was written to `target_dir/<basename>`
/// * `Err(DownloadError)` - Nothing was written (any partial file is removed)
pub async fn download_image(
    client: &Client,
    url: &Url,
    target_dir: &Path,
) -> Result<DownloadedImage, DownloadError> {
    let file_name = file_name_for(url)?;
    let mut response = send(client, url).await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let target = target_dir.join(&file_name);
    let partial = PartialFile::new(target_dir);

    let bytes = stream_to_file(&mut response, url, partial.path()).await?;

    partial
        .persist(&target)
        .await
        .map_err(|e| DownloadError::io(&target, e))?;

    Ok(DownloadedImage {
        url: url.to_string(),
        path: target,
        bytes,
    })
}

/// Writes the response body chunk by chunk and returns the byte count
async fn stream_to_file(
    response: &mut Response,
    url: &Url,
    path: &Path,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| FetchError::classify(url.as_str(), &e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| DownloadError::io(path, e))?;

    Ok(written)
}
