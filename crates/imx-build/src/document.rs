//! # Source Documents
//!
//! A `SourceDocument` pairs the parsed value of a file with the exact text
//! read from disk. The original text is what the source rewriter compares
//! the canonical form against.

use std::path::{Path, PathBuf};

use imx_core::{parse_document, CanonicalText};
use rayon::prelude::*;
use serde_json::Value;

use crate::error::BuildError;
use crate::rewrite::PendingRewrite;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path the document was read from.
    pub path: PathBuf,
    /// File content exactly as read.
    pub original: String,
    /// Parsed (and, for features, canonicalized) value.
    pub value: Value,
}

impl SourceDocument {
    /// Read and strictly parse a document.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Encoding` if the file is not UTF-8,
    /// `BuildError::Io` if it cannot be read otherwise and
    /// `BuildError::Parse` if it is not JSON or repeats a key.
    pub fn read(path: &Path) -> Result<Self, BuildError> {
        let original = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => BuildError::Encoding {
                path: path.to_path_buf(),
            },
            _ => BuildError::io(path, e),
        })?;
        let value = parse_document(&original).map_err(|source| BuildError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
            value,
        })
    }

    /// The `id` member as a string, if present.
    pub fn id(&self) -> Option<&str> {
        self.value.get("id").and_then(Value::as_str)
    }

    /// The canonical pretty text of the current value.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Canonicalization` if serialization fails.
    pub fn canonical_text(&self) -> Result<CanonicalText, BuildError> {
        CanonicalText::pretty(&self.value).map_err(|source| BuildError::Canonicalization {
            path: self.path.clone(),
            source,
        })
    }

    /// Queue entry comparing the canonical text with the original.
    ///
    /// # Errors
    ///
    /// See [`canonical_text`](Self::canonical_text).
    pub fn pending_rewrite(&self) -> Result<PendingRewrite, BuildError> {
        Ok(PendingRewrite {
            path: self.path.clone(),
            original: self.original.clone(),
            canonical: self.canonical_text()?,
        })
    }
}

/// Apply `f` to every path, on the rayon pool when `parallel` is set.
///
/// Results come back in the order of `paths` either way; workers share
/// nothing but `f`.
pub fn map_paths<T, F>(paths: &[PathBuf], parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Path) -> T + Sync + Send,
{
    if parallel {
        paths.par_iter().map(|p| f(p.as_path())).collect()
    } else {
        paths.iter().map(|p| f(p.as_path())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_keeps_original_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        let text = "{\"id\":\"a\",  \"name\": \"A\"}";
        std::fs::write(&path, text).unwrap();

        let doc = SourceDocument::read(&path).unwrap();
        assert_eq!(doc.original, text);
        assert_eq!(doc.id(), Some("a"));
        let pending = doc.pending_rewrite().unwrap();
        assert!(!pending.is_canonical());
    }

    #[test]
    fn read_rejects_duplicate_keys_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.json");
        std::fs::write(&path, "{\"id\": \"a\", \"id\": \"b\"}").unwrap();

        match SourceDocument::read(&path).unwrap_err() {
            BuildError::Parse { path: p, source } => {
                assert_eq!(p, path);
                assert!(source.to_string().contains("duplicate key"));
            }
            other => panic!("expected Parse, got {other}"),
        }
    }

    #[test]
    fn non_utf8_file_blames_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.json");
        std::fs::write(&path, b"{\"name\": \"M\xfcnchen\"}").unwrap();

        let err = SourceDocument::read(&path).unwrap_err();
        assert!(matches!(&err, BuildError::Encoding { path: p } if p == &path));
        assert!(err.is_dataset_error());
    }

    #[test]
    fn map_paths_preserves_order() {
        let paths: Vec<PathBuf> = (0..64).map(|i| PathBuf::from(format!("{i:03}"))).collect();
        let seq = map_paths(&paths, false, |p| p.display().to_string());
        let par = map_paths(&paths, true, |p| p.display().to_string());
        assert_eq!(seq, par);
        assert_eq!(par[10], "010");
    }
}
