//! # Source Rewriter
//!
//! Compares each loaded document's canonical text with the bytes read
//! from disk and overwrites the file only when they differ. A second
//! build over the rewritten tree finds nothing to do.
//!
//! [`check_sources`] is the compare-only twin used by `imx check`.

use std::path::{Path, PathBuf};

use imx_core::CanonicalText;
use tracing::debug;

use crate::error::{BuildError, BuildFailure};

/// A source document and its canonical form.
#[derive(Debug, Clone)]
pub struct PendingRewrite {
    /// File the document was read from.
    pub path: PathBuf,
    /// File content captured at parse time.
    pub original: String,
    /// Canonical pretty serialization of the loaded document.
    pub canonical: CanonicalText,
}

impl PendingRewrite {
    /// True if the file on disk is already canonical.
    pub fn is_canonical(&self) -> bool {
        self.original.as_bytes() == self.canonical.as_bytes()
    }
}

/// Every loaded document, in path order.
#[derive(Debug, Clone, Default)]
pub struct RewriteQueue {
    entries: Vec<PendingRewrite>,
}

impl RewriteQueue {
    /// Append a document.
    pub fn push(&mut self, entry: PendingRewrite) {
        self.entries.push(entry);
    }

    /// Append every document of another queue.
    pub fn extend(&mut self, other: RewriteQueue) {
        self.entries.extend(other.entries);
    }

    /// Returns the number of queued documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the queued documents.
    pub fn iter(&self) -> impl Iterator<Item = &PendingRewrite> {
        self.entries.iter()
    }
}

/// Outcome of a rewrite (or check) pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Files whose content differed from the canonical form.
    pub rewritten: Vec<PathBuf>,
    /// Number of files already canonical.
    pub unchanged: usize,
}

/// Overwrite every non-canonical document with its canonical form.
///
/// IO failures do not stop the pass; all of them are reported together.
///
/// # Errors
///
/// Returns a `BuildFailure` of `BuildError::Io` for each file that could
/// not be written.
pub fn rewrite_sources(queue: &RewriteQueue) -> Result<RewriteReport, BuildFailure> {
    let mut report = RewriteReport::default();
    let mut errors = Vec::new();
    for entry in queue.iter() {
        if entry.is_canonical() {
            report.unchanged += 1;
            continue;
        }
        match std::fs::write(&entry.path, entry.canonical.as_bytes()) {
            Ok(()) => {
                debug!(path = %entry.path.display(), "rewrote source in canonical form");
                report.rewritten.push(entry.path.clone());
            }
            Err(e) => errors.push(BuildError::io(&entry.path, e)),
        }
    }
    match BuildFailure::from_errors(errors) {
        Some(failure) => Err(failure),
        None => Ok(report),
    }
}

/// Report which documents a rewrite would change, without writing.
pub fn check_sources(queue: &RewriteQueue) -> RewriteReport {
    let mut report = RewriteReport::default();
    for entry in queue.iter() {
        if entry.is_canonical() {
            report.unchanged += 1;
        } else {
            debug!(path = %entry.path.display(), "source is not canonical");
            report.rewritten.push(entry.path.clone());
        }
    }
    report
}

/// Write `bytes` to `path` unless the file already holds exactly them.
/// Creates missing parent directories. Returns whether the file was written.
///
/// # Errors
///
/// Returns `BuildError::Io` if a directory cannot be created or the file
/// cannot be written.
pub fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<bool, BuildError> {
    match std::fs::read(path) {
        Ok(existing) if existing == bytes => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(BuildError::io(path, e)),
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| BuildError::io(path, e))?;
    Ok(true)
}
