//! Batch Orchestrator — unpack, discover, extract, summarize, report.
//!
//! Flow per run:
//! 1. Fresh staging dir under `BatchOptions::staging_root`, ZIP unpacked into it.
//! 2. Staging tree walked; `.docx` / `.pdf` files become candidates.
//! 3. Candidates go through a bounded, order-preserving pool
//!    (`futures::StreamExt::buffered`): extract text on the blocking pool,
//!    pattern-match contact fields, summarize the full text.
//! 4. Rows are appended in discovery order regardless of completion order.
//! 5. Report saved atomically to the output path; staging cleaned per policy.
//!
//! Unreadable documents are logged and recorded in `BatchRun::failures`;
//! they never abort the run.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::batch::archive::{self, CandidateDocument};
use crate::batch::{BatchError, BatchOptions, BatchRun, FileFailure};
use crate::extraction::extract_text;
use crate::extraction::fields::extract_fields;
use crate::report::{Report, ReportError, ReportRow};
use crate::summarizer::{Summarizer, SummaryResult};

enum FileOutcome {
    Row(ReportRow),
    Failed(FileFailure),
}

/// Runs one batch: `archive_path` (ZIP) in, XLSX report at `output_path` out.
pub async fn process_batch(
    archive_path: &Path,
    output_path: &Path,
    options: &BatchOptions,
    summarizer: Arc<dyn Summarizer>,
) -> Result<BatchRun, BatchError> {
    let staging = archive::create_staging_dir(&options.staging_root)?;
    info!(
        "Batch started: archive={} staging={}",
        archive_path.display(),
        staging.display()
    );

    let result = run_staged(archive_path, output_path, options, summarizer.as_ref(), &staging).await;
    archive::cleanup_staging(&staging, options.cleanup);

    match &result {
        Ok(run) => info!(
            "Batch finished: {} rows, {} failed, {} unsupported → {}",
            run.report.len(),
            run.failures.len(),
            run.unsupported,
            output_path.display()
        ),
        Err(e) => warn!("Batch aborted: {e}"),
    }
    result
}

async fn run_staged(
    archive_path: &Path,
    output_path: &Path,
    options: &BatchOptions,
    summarizer: &dyn Summarizer,
    staging: &Path,
) -> Result<BatchRun, BatchError> {
    let archive_owned = archive_path.to_path_buf();
    let staging_owned = staging.to_path_buf();
    let max_entry_bytes = options.max_entry_bytes;
    let discovery = tokio::task::spawn_blocking(move || {
        archive::unpack_archive(&archive_owned, &staging_owned, max_entry_bytes)?;
        archive::discover_candidates(&staging_owned)
    })
    .await??;

    debug!(
        "Discovered {} candidates ({} unsupported files skipped)",
        discovery.candidates.len(),
        discovery.unsupported
    );

    let outcomes: Vec<Result<FileOutcome, BatchError>> = stream::iter(discovery.candidates)
        .map(|doc| process_document(doc, summarizer))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut report = Report::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome? {
            FileOutcome::Row(row) => report.append(row),
            FileOutcome::Failed(failure) => failures.push(failure),
        }
    }

    let out = output_path.to_path_buf();
    let report = tokio::task::spawn_blocking(move || report.save(&out).map(|_| report))
        .await?
        .map_err(|e| match e {
            ReportError::Xlsx(_) => BatchError::Report(e),
            ReportError::Io(_) => BatchError::OutputWrite {
                path: output_path.to_path_buf(),
                source: e,
            },
        })?;

    Ok(BatchRun {
        report,
        failures,
        unsupported: discovery.unsupported,
    })
}

async fn process_document(
    doc: CandidateDocument,
    summarizer: &dyn Summarizer,
) -> Result<FileOutcome, BatchError> {
    let path = doc.path.clone();
    let format = doc.format;
    let extracted = tokio::task::spawn_blocking(move || -> Result<String, String> {
        let bytes = std::fs::read(&path).map_err(|e| format!("cannot read file: {e}"))?;
        extract_text(format, &bytes).map_err(|e| e.to_string())
    })
    .await?;

    let text = match extracted {
        Ok(text) => text,
        Err(reason) => {
            warn!("Skipping {}: {}", doc.path.display(), reason);
            return Ok(FileOutcome::Failed(FileFailure {
                path: doc.path,
                reason,
            }));
        }
    };

    let fields = extract_fields(&text);
    let summary = match summarizer.summarize(&text).await {
        Ok(result) => {
            if result.is_failure() {
                debug!("Summarizer reported a failure for {}", doc.path.display());
            }
            result
        }
        Err(e) => {
            warn!("Summarization failed for {}: {}", doc.path.display(), e);
            SummaryResult::Failure(format!("Error: request failed - {e}"))
        }
    };

    debug!(
        "Processed {} ({}): {} emails, {} phones, {} chars",
        doc.path.display(),
        format,
        fields.emails.len(),
        fields.phone_numbers.len(),
        text.len()
    );

    Ok(FileOutcome::Row(ReportRow {
        name: doc.name(),
        emails: fields.joined_emails(),
        phones: fields.joined_phones(),
        full_text: text,
        summary: summary.into_cell(),
    }))
}
