//! Document text extraction, one backend per supported format.
//!
//! The batch pipeline only hands over files whose extension maps to a
//! `DocumentFormat`; everything else is skipped before reaching this module.

use std::fmt;
use std::path::Path;

use thiserror::Error;

pub mod docx;
pub mod fields;
pub mod pdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Classifies a path by its extension, case-insensitively.
    /// Returns `None` for anything that is not `.docx` or `.pdf`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Docx => write!(f, "DOCX"),
            DocumentFormat::Pdf => write!(f, "PDF"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unreadable {format} document: {reason}")]
    Unreadable {
        format: DocumentFormat,
        reason: String,
    },
}

/// Extracts the plain text of a document. CPU-bound; callers on the async
/// runtime should run this inside `spawn_blocking`.
pub fn extract_text(format: DocumentFormat, bytes: &[u8]) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Docx => docx::extract_docx_text(bytes),
        DocumentFormat::Pdf => pdf::extract_pdf_text(bytes),
    }
}
