//! # Document Discovery
//!
//! Recursively lists the documents of a collection. The result is sorted
//! by the raw bytes of each path, never by locale collation or directory
//! enumeration order, so every later stage sees the same sequence on
//! every machine.

use std::path::{Path, PathBuf};

use crate::error::BuildError;

/// Recursively find files under `root` whose extension is one of
/// `extensions` (ASCII case-insensitive), sorted byte-wise.
///
/// # Errors
///
/// Returns `BuildError::Config` if `root` is not a directory and
/// `BuildError::Io` if a directory cannot be read.
pub fn discover_documents(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, BuildError> {
    if !root.is_dir() {
        return Err(BuildError::Config(format!(
            "document directory not found: {}",
            root.display()
        )));
    }
    let mut found = Vec::new();
    walk(root, extensions, &mut found)?;
    sort_paths(&mut found);
    Ok(found)
}

fn walk(dir: &Path, extensions: &[String], found: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    let entries = std::fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            walk(&path, extensions, found)?;
        } else if has_extension(&path, extensions) {
            found.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Sort paths by their encoded bytes.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().as_encoded_bytes().cmp(b.as_os_str().as_encoded_bytes()));
}
