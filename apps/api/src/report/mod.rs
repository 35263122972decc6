//! Report Writer — accumulates one row per processed CV and serializes the
//! result to a single-sheet XLSX workbook.
//!
//! Every cell is written as a string so phone numbers are never coerced to
//! numbers. XLSX caps a cell at 32,767 characters: the `Overall Text` column
//! spills anything beyond that into continuation cells to the right of the
//! header columns, other columns are truncated at the cap.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;
use tracing::{debug, warn};

pub const HEADER: [&str; 5] = [
    "Name",
    "Email ID",
    "Contact No.",
    "Overall Text",
    "Overall Summary",
];
pub const SHEET_NAME: &str = "CVs";
/// Maximum characters XLSX allows in a single cell.
pub const MAX_CELL_CHARS: usize = 32_767;

const FULL_TEXT_COL: u16 = 3;
const FIRST_OVERFLOW_COL: u16 = HEADER.len() as u16;
const COLUMN_WIDTHS: [f64; 5] = [24.0, 36.0, 24.0, 80.0, 80.0];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub emails: String,
    pub phones: String,
    pub full_text: String,
    pub summary: String,
}

impl ReportRow {
    fn cells(&self) -> [&str; 5] {
        [
            &self.name,
            &self.emails,
            &self.phones,
            &self.full_text,
            &self.summary,
        ]
    }
}

/// In-memory report: the fixed header plus rows in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the whole report to XLSX bytes.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        let bold = Format::new().set_bold();
        for (col, (title, width)) in HEADER.iter().zip(COLUMN_WIDTHS).enumerate() {
            let col = col as u16;
            sheet.write_string_with_format(0, col, *title, &bold)?;
            sheet.set_column_width(col, width)?;
        }

        for (idx, row) in self.rows.iter().enumerate() {
            let r = (idx + 1) as u32;
            for (col, value) in row.cells().into_iter().enumerate() {
                let col = col as u16;
                let chunks = split_cell(value);
                if col == FULL_TEXT_COL {
                    for (n, chunk) in chunks.iter().enumerate() {
                        let target = if n == 0 {
                            col
                        } else {
                            FIRST_OVERFLOW_COL + (n as u16 - 1)
                        };
                        sheet.write_string(r, target, *chunk)?;
                    }
                    if chunks.len() > 1 {
                        debug!(
                            "Row {} ('{}'): Overall Text spilled into {} continuation cells",
                            r,
                            row.name,
                            chunks.len() - 1
                        );
                    }
                } else {
                    if chunks.len() > 1 {
                        warn!(
                            "Row {} ('{}'): {} column truncated to {} characters",
                            r, row.name, HEADER[col as usize], MAX_CELL_CHARS
                        );
                    }
                    sheet.write_string(r, col, chunks[0])?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Writes the workbook to `path` atomically: the bytes go to a temp file
    /// in the same directory which is then renamed over `path`. On error no
    /// partial file is left at `path`.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let bytes = self.to_xlsx_bytes()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".cv_report")
            .suffix(".xlsx.tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| ReportError::Io(e.error))?;

        debug!("Saved report with {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Splits a value into cell-sized chunks on char boundaries. Always returns
/// at least one chunk (possibly empty).
fn split_cell(value: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    loop {
        match rest.char_indices().nth(MAX_CELL_CHARS) {
            Some((cut, _)) => {
                chunks.push(&rest[..cut]);
                rest = &rest[cut..];
            }
            None => {
                chunks.push(rest);
                return chunks;
            }
        }
    }
}
