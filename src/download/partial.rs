use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static PARTIAL_SEQ: AtomicU64 = AtomicU64::new(0);

/// A `.part` file that is removed unless it is persisted
///
/// Each partial name is unique within the process, so two concurrent downloads
/// sharing a basename never write into the same file. The name leaves out the
/// basename so a final name near the length limit still has room. The rename on persist makes
/// the last completed download the one that survives.
#[derive(Debug)]
pub(crate) struct PartialFile {
    path: PathBuf,
    persisted: bool,
}

impl PartialFile {
    pub(crate) fn new(dir: &Path) -> Self {
        let seq = PARTIAL_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!(".{}-{}.part", std::process::id(), seq));

        Self {
            path,
            persisted: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the partial file onto `target`, replacing any existing file
    pub(crate) async fn persist(mut self, target: &Path) -> std::io::Result<()> {
        tokio::fs::rename(&self.path, target).await?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Synchronous unlink on the calling thread; Drop cannot await.
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
