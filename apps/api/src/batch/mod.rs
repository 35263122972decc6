// Batch pipeline: ZIP of CVs in, one XLSX report out.
// Per-file extraction failures are skipped and recorded; archive and output
// failures abort the run.

pub mod archive;
pub mod handlers;
pub mod orchestrator;

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::report::{Report, ReportError};

pub use orchestrator::process_batch;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("archive {path} is not a readable ZIP: {reason}")]
    ArchiveCorrupt { path: PathBuf, reason: String },

    #[error("staging area error at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build report: {0}")]
    Report(ReportError),

    #[error("failed to write report to {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: ReportError,
    },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What happens to the per-run staging directory once the batch is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Remove the directory only if nothing is left in it.
    #[default]
    IfEmpty,
    /// Remove the directory and everything under it.
    Purge,
}

impl FromStr for CleanupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "if_empty" => Ok(CleanupPolicy::IfEmpty),
            "purge" => Ok(CleanupPolicy::Purge),
            other => Err(format!(
                "unknown cleanup policy '{other}' (expected 'if_empty' or 'purge')"
            )),
        }
    }
}

/// Caller-supplied knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Parent directory for per-run staging directories.
    pub staging_root: PathBuf,
    pub cleanup: CleanupPolicy,
    /// Maximum documents processed (and summarized) at the same time.
    pub concurrency: usize,
    /// Archive entries larger than this are skipped.
    pub max_entry_bytes: u64,
}

/// A candidate document that was skipped because its text could not be read.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one batch run produced.
#[derive(Debug)]
pub struct BatchRun {
    pub report: Report,
    pub failures: Vec<FileFailure>,
    /// Files skipped because their extension is neither `.docx` nor `.pdf`.
    pub unsupported: usize,
}
