use crate::output::event_log::run_log_file_name;
use crate::output::traits::{OutputError, OutputResult};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Directory layout of one run
///
/// ```text
/// <out>/
///   imgs/                     downloaded images, named by URL basename
///   log/<start-time>.txt      append-only run log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: PathBuf,
}

impl RunLayout {
    /// Computes the layout for a run without touching the filesystem
    pub fn new(root: &Path, started_at: &DateTime<Local>) -> Self {
        let images_dir = root.join("imgs");
        let log_dir = root.join("log");
        let log_file = log_dir.join(run_log_file_name(started_at));

        Self {
            root: root.to_path_buf(),
            images_dir,
            log_dir,
            log_file,
        }
    }

    /// Computes the layout and creates both directories
    pub fn prepare(root: &Path, started_at: &DateTime<Local>) -> OutputResult<Self> {
        let layout = Self::new(root, started_at);

        for dir in [&layout.images_dir, &layout.log_dir] {
            if dir.is_dir() {
                continue;
            }
            std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
            tracing::info!("Directory '{}' didn't exist. Created.", dir.display());
        }

        Ok(layout)
    }
}
