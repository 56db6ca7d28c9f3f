//! # Artifact Emitter
//!
//! Renders the aggregate artifacts from the loaded indices and writes
//! the ones whose bytes changed.
//!
//! | artifact | content |
//! |----------|---------|
//! | `features.json` / `features.min.json` | `{"features": {<id>: <feature>}}` |
//! | `resources.json` / `resources.min.json` | `{"resources": {<id>: <resource>}}` |
//! | i18n extract | `<locale>.<namespace>.<id>.{attribution.text, description, name}` |
//!
//! Rendering happens entirely in memory before anything is written, so a
//! rendering failure leaves the output directory untouched.

use std::path::{Path, PathBuf};

use imx_core::{CanonicalText, CanonicalizationError};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{BuildError, BuildFailure};
use crate::features::FeatureIndex;
use crate::i18n::I18nBundle;
use crate::resources::ResourceIndex;
use crate::rewrite::write_if_changed;

/// Pretty feature aggregate, under `dist_dir`.
pub const FEATURES_FILE: &str = "features.json";
/// Compact feature aggregate.
pub const FEATURES_MIN_FILE: &str = "features.min.json";
/// Pretty resource aggregate.
pub const RESOURCES_FILE: &str = "resources.json";
/// Compact resource aggregate.
pub const RESOURCES_MIN_FILE: &str = "resources.min.json";

/// One rendered artifact.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Destination path.
    pub path: PathBuf,
    /// Bytes to write.
    pub content: String,
}

/// Where the artifacts go and how the extract is keyed.
#[derive(Debug, Clone)]
pub struct EmitTarget<'a> {
    /// Directory of the JSON aggregates.
    pub dist_dir: &'a Path,
    /// Path of the localization extract.
    pub i18n_path: &'a Path,
    /// Top-level key of the extract.
    pub locale: &'a str,
    /// Second-level key of the extract.
    pub namespace: &'a str,
}

/// Outcome of writing the artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Artifacts whose content changed.
    pub written: Vec<PathBuf>,
    /// Artifacts already up to date.
    pub unchanged: usize,
}

/// Render every artifact, in a fixed order.
///
/// # Errors
///
/// Returns `Canonicalization` or `Extract` if serialization fails.
pub fn render(
    features: &FeatureIndex,
    resources: &ResourceIndex,
    i18n: &I18nBundle,
    target: &EmitTarget<'_>,
) -> Result<Vec<Artifact>, BuildError> {
    let features_value = aggregate("features", features.iter().map(|f| (f.id.as_str(), &f.document)));
    let resources_value = aggregate(
        "resources",
        resources.iter().map(|r| (r.id.as_str(), &r.document)),
    );

    let dist = target.dist_dir;
    let json = |file: &str, text: Result<CanonicalText, CanonicalizationError>| {
        let path = dist.join(file);
        match text {
            Ok(text) => Ok(Artifact {
                path,
                content: text.into_string(),
            }),
            Err(source) => Err(BuildError::Canonicalization { path, source }),
        }
    };

    let extract = i18n
        .to_extract_yaml(target.locale, target.namespace)
        .map_err(|source| BuildError::Extract {
            path: target.i18n_path.to_path_buf(),
            source,
        })?;

    Ok(vec![
        json(FEATURES_FILE, CanonicalText::pretty(&features_value))?,
        json(FEATURES_MIN_FILE, CanonicalText::compact(&features_value))?,
        json(RESOURCES_FILE, CanonicalText::pretty(&resources_value))?,
        json(RESOURCES_MIN_FILE, CanonicalText::compact(&resources_value))?,
        Artifact {
            path: target.i18n_path.to_path_buf(),
            content: extract,
        },
    ])
}

fn aggregate<'a>(key: &str, entries: impl Iterator<Item = (&'a str, &'a Value)>) -> Value {
    let members: Map<String, Value> = entries
        .map(|(id, document)| (id.to_string(), document.clone()))
        .collect();
    let mut root = Map::new();
    root.insert(key.to_string(), Value::Object(members));
    Value::Object(root)
}

/// Write the rendered artifacts, skipping those already up to date.
///
/// # Errors
///
/// Returns a `BuildFailure` of `Io` errors; artifacts that could be
/// written still are.
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<EmitReport, BuildFailure> {
    let mut report = EmitReport::default();
    let mut errors = Vec::new();
    for artifact in artifacts {
        match write_if_changed(&artifact.path, artifact.content.as_bytes()) {
            Ok(true) => {
                debug!(path = %artifact.path.display(), "wrote artifact");
                report.written.push(artifact.path.clone());
            }
            Ok(false) => report.unchanged += 1,
            Err(e) => errors.push(e),
        }
    }
    match BuildFailure::from_errors(errors) {
        Some(failure) => Err(failure),
        None => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aggregate_keeps_iteration_order() {
        let a = json!({"id": "a"});
        let b = json!({"id": "b"});
        let value = aggregate("features", [("a", &a), ("b", &b)].into_iter());
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"features":{"a":{"id":"a"},"b":{"id":"b"}}}"#
        );
    }

    #[test]
    fn empty_indices_render_empty_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let i18n_path = dir.path().join("i18n/en.yaml");
        let target = EmitTarget {
            dist_dir: dir.path(),
            i18n_path: &i18n_path,
            locale: "en",
            namespace: "imagery",
        };
        let artifacts = render(
            &FeatureIndex::default(),
            &ResourceIndex::default(),
            &I18nBundle::default(),
            &target,
        )
        .unwrap();
        assert_eq!(artifacts.len(), 5);
        assert_eq!(artifacts[0].content, "{\n    \"features\": {}\n}\n");
        assert_eq!(artifacts[1].content, "{\"features\":{}}\n");
        assert_eq!(artifacts[3].content, "{\"resources\":{}}\n");
        assert_eq!(artifacts[4].content, "en:\n  imagery: {}\n");

        let first = write_artifacts(&artifacts).unwrap();
        assert_eq!(first.written.len(), 5);
        let second = write_artifacts(&artifacts).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged, 5);
    }
}
