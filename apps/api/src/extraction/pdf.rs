//! PDF text extraction via `pdf-extract`.
//!
//! Reads the embedded text layer only. Scanned/image-only PDFs come back as
//! an empty or near-empty string; that is accepted, not an error (no OCR).

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{DocumentFormat, ExtractError};

/// Concatenated text of every page, in page order.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let result = catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(unreadable(format!("{e:?}"))),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "PDF backend panicked".to_string());
            Err(unreadable(reason))
        }
    }
}

fn unreadable(reason: String) -> ExtractError {
    ExtractError::Unreadable {
        format: DocumentFormat::Pdf,
        reason,
    }
}
