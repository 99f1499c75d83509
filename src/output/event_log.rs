//! Append-only JSON-lines run log
//!
//! Every event of a run becomes one line in `<out>/log/<start-time>.txt`.
//! The file is opened in append mode and never truncated.

use crate::output::traits::{EventRecorder, OutputError, OutputResult, RunEvent};
use chrono::{DateTime, TimeZone};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the run log for a run started at `started_at`
///
/// Format: `YYYY-MM-DDTHH-MM-SS.txt` (colons are not portable in file names).
pub fn run_log_file_name<Tz>(started_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}.txt", started_at.format("%Y-%m-%dT%H-%M-%S"))
}

/// Run log writing one JSON object per line
///
/// Writes are synchronous `std::fs` calls made on whichever task records the
/// event. Each is a single short line behind a mutex, so records from
/// concurrent tasks never interleave.
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesLog {
    /// Opens (or creates) the log file in append mode
    pub fn open(path: &Path) -> OutputResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventRecorder for JsonLinesLog {
    fn record(&self, event: &RunEvent) -> OutputResult<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| OutputError::Write("run log lock poisoned".to_string()))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Reads a run log back into events
pub fn read_run_log(path: &Path) -> OutputResult<Vec<RunEvent>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(OutputError::from))
        .collect()
}
