//! Staging area handling: unpack the uploaded ZIP, discover candidate
//! documents, clean up afterwards.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::batch::{BatchError, CleanupPolicy};
use crate::extraction::DocumentFormat;

/// A file inside the staging tree whose extension maps to a supported format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

impl CandidateDocument {
    /// File name without its extension, used as the report's `Name` cell.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of walking the staging tree.
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<CandidateDocument>,
    /// Regular files skipped because their extension is not supported.
    pub unsupported: usize,
}

/// Creates a fresh, uniquely named staging directory under `root`.
pub fn create_staging_dir(root: &Path) -> Result<PathBuf, BatchError> {
    let dir = root.join(format!("batch-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).map_err(|e| BatchError::Staging {
        path: dir.clone(),
        source: e,
    })?;
    Ok(dir)
}

/// Unpacks every entry of the ZIP at `archive_path` into `dest`.
///
/// Entries whose names escape `dest` and entries that declare or inflate to
/// more than `max_entry_bytes` are skipped with a warning. Anything that prevents
/// reading the archive itself is `ArchiveCorrupt`. Returns the number of
/// files written.
pub fn unpack_archive(
    archive_path: &Path,
    dest: &Path,
    max_entry_bytes: u64,
) -> Result<usize, BatchError> {
    let corrupt = |reason: String| BatchError::ArchiveCorrupt {
        path: archive_path.to_path_buf(),
        reason,
    };
    let staging = |path: &Path, source: io::Error| BatchError::Staging {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(archive_path).map_err(|e| corrupt(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| corrupt(e.to_string()))?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| staging(&target, e))?;
            continue;
        }

        if entry.size() > max_entry_bytes {
            warn!(
                "Skipping archive entry {} ({} bytes, limit {})",
                entry.name(),
                entry.size(),
                max_entry_bytes
            );
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| staging(parent, e))?;
        }
        let name = entry.name().to_string();
        let mut out = File::create(&target).map_err(|e| staging(&target, e))?;
        let copied = copy_capped(&mut entry, &mut out, max_entry_bytes).map_err(|e| {
            match e.kind() {
                // Decompression failures surface from the entry reader as I/O errors.
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                    corrupt(format!("{name}: {e}"))
                }
                _ => staging(&target, e),
            }
        })?;

        if copied.is_none() {
            drop(out);
            fs::remove_file(&target).map_err(|e| staging(&target, e))?;
            warn!(
                "Skipping archive entry {} (inflates past limit {} bytes)",
                name, max_entry_bytes
            );
            continue;
        }
        written += 1;
    }

    debug!("Unpacked {} files into {}", written, dest.display());
    Ok(written)
}

/// Copies at most `limit` bytes from `reader`. Returns `None` when the
/// source holds more than `limit` bytes; the header-declared entry size is
/// not trusted.
fn copy_capped<R: Read, W: Write>(
    reader: R,
    writer: &mut W,
    limit: u64,
) -> io::Result<Option<u64>> {
    let copied = io::copy(&mut reader.take(limit.saturating_add(1)), writer)?;
    Ok((copied <= limit).then_some(copied))
}

/// Recursively walks `root` and classifies every regular file by extension.
///
/// Entries are visited sorted by file name, so discovery order is stable
/// for a given archive on a given platform.
pub fn discover_candidates(root: &Path) -> Result<Discovery, BatchError> {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| BatchError::Staging {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e
                .into_io_error()
                .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        match DocumentFormat::from_path(entry.path()) {
            Some(format) => discovery.candidates.push(CandidateDocument {
                path: entry.into_path(),
                format,
            }),
            None => {
                debug!("Skipping unsupported file {}", entry.path().display());
                discovery.unsupported += 1;
            }
        }
    }

    Ok(discovery)
}

/// Best-effort removal of the staging directory. Never fails the batch.
pub fn cleanup_staging(dir: &Path, policy: CleanupPolicy) {
    let result = match policy {
        CleanupPolicy::IfEmpty => match fs::read_dir(dir).map(|mut e| e.next().is_none()) {
            Ok(true) => fs::remove_dir(dir),
            Ok(false) => {
                debug!("Leaving non-empty staging dir {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        },
        CleanupPolicy::Purge => match fs::remove_dir_all(dir) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
    };

    if let Err(e) = result {
        warn!("Failed to clean up staging dir {}: {}", dir.display(), e);
    }
}
