//! Output module for run logs and summaries
//!
//! This module handles:
//! - The on-disk layout of a run (`imgs/`, `log/`)
//! - Recording run events into the append-only run log
//! - Echoing events to the console through `tracing`
//! - The end-of-run tally

mod event_log;
mod layout;
pub mod stats;
mod traits;

pub use event_log::{read_run_log, run_log_file_name, JsonLinesLog};
pub use layout::RunLayout;
pub use stats::{print_summary, RunSummary};
pub use traits::{
    EventRecorder, FailureKind, MemoryRecorder, Outcome, OutputError, OutputResult, RunEvent,
    Stage,
};

/// Echoes an event to the console and appends it to the recorder
///
/// A recorder that cannot write is reported but never stops the run.
pub fn emit(recorder: &dyn EventRecorder, event: RunEvent) {
    match event.outcome {
        Outcome::Success => {
            tracing::info!("[{}] {}: {}", event.stage, event.url, event.message)
        }
        Outcome::Failure => {
            tracing::warn!("[{}] {}: {}", event.stage, event.url, event.message)
        }
    }

    if let Err(e) = recorder.record(&event) {
        tracing::error!("Failed to record run event for {}: {}", event.url, e);
    }
}
