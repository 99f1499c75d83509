//! Event recorder traits and types
//!
//! This module defines the trait interface for run event recorders and the
//! records they receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize run event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Pipeline stage an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Run start and finish markers
    Run,
    /// Link discovery and traversal
    Crawl,
    /// Lazy-load image source harvesting
    Harvest,
    /// Image download
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Crawl => "crawl",
            Self::Harvest => "harvest",
            Self::Download => "download",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the event reports a success or a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Redirect chain exceeded the cap
    TooManyRedirects,
    /// Malformed or invalid HTTP exchange
    HttpError,
    /// DNS, connection, timeout or reset failure
    NetworkError,
    /// Any response other than 200
    NonSuccessStatus,
    /// Directory creation or file write failure
    FilesystemError,
    /// A URL that could not be parsed or turned into a file name
    InvalidUrl,
    /// A page expansion panicked
    Internal,
}

/// One record of the run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// When the event happened (UTC)
    pub timestamp: DateTime<Utc>,

    /// Pipeline stage
    pub stage: Stage,

    /// URL the event is about
    pub url: String,

    /// Success or failure
    pub outcome: Outcome,

    /// Failure classification, absent for successes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,

    /// Human readable description
    pub message: String,
}

impl RunEvent {
    /// Creates a success event stamped with the current time
    pub fn success(stage: Stage, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            url: url.into(),
            outcome: Outcome::Success,
            kind: None,
            message: message.into(),
        }
    }

    /// Creates a failure event stamped with the current time
    pub fn failure(
        stage: Stage,
        url: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            url: url.into(),
            outcome: Outcome::Failure,
            kind: Some(kind),
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }
}

/// Trait for run event recorders
///
/// Recorders receive every success and failure of a run. Implementations must be
/// thread-safe; the crawl and download stages record from concurrent tasks.
pub trait EventRecorder: Send + Sync {
    /// Records one event
    ///
    /// # Arguments
    ///
    /// * `event` - The event to append
    fn record(&self, event: &RunEvent) -> OutputResult<()>;
}

/// Recorder that keeps events in memory
///
/// Useful for embedding the traverser without a run log on disk.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns only the failure events
    pub fn failures(&self) -> Vec<RunEvent> {
        self.events()
            .into_iter()
            .filter(RunEvent::is_failure)
            .collect()
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&self, event: &RunEvent) -> OutputResult<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| OutputError::Write("event buffer lock poisoned".to_string()))?;
        events.push(event.clone());
        Ok(())
    }
}
