//! # Feature Loader
//!
//! Loads every feature document, canonicalizes its geometry and indexes it
//! by id.
//!
//! Per document, in order:
//!
//! 1. strict parse;
//! 2. unwrap a `FeatureCollection` holding exactly one feature;
//! 3. schema validation;
//! 4. geometry canonicalization and conventional key order;
//! 5. canonical text for the source rewriter.
//!
//! Steps 1-5 are independent per file and may run on the rayon pool.
//! Indexing and duplicate detection happen afterwards, sequentially, in
//! path order, so the outcome never depends on scheduling.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use imx_core::{order_feature_keys, GeometryCanonicalizer, SourceId};
use imx_schema::{DocumentKind, SchemaValidator};
use serde_json::Value;
use tracing::{info, warn};

use crate::document::{map_paths, SourceDocument};
use crate::error::{BuildError, BuildFailure};
use crate::lint::{lint_feature, Lint, LintKind};
use crate::rewrite::{PendingRewrite, RewriteQueue};

/// A loaded, canonical feature.
#[derive(Debug, Clone)]
pub struct Feature {
    /// The feature's id.
    pub id: SourceId,
    /// File it was loaded from.
    pub path: PathBuf,
    /// The canonical document.
    pub document: Value,
}

/// Features keyed by id, in byte-wise id order.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    features: BTreeMap<SourceId, Feature>,
}

impl FeatureIndex {
    /// Look up a feature.
    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    /// True if a feature with this id was loaded.
    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    /// Returns the number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if no feature was loaded.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    fn insert(&mut self, feature: Feature) -> Result<(), BuildError> {
        if let Some(first) = self.features.get(&feature.id) {
            return Err(BuildError::DuplicateId {
                kind: DocumentKind::Feature,
                id: feature.id.to_string(),
                first: first.path.clone(),
                second: feature.path,
            });
        }
        self.features.insert(feature.id.clone(), feature);
        Ok(())
    }
}

/// Everything the feature stage hands on.
#[derive(Debug, Default)]
pub struct LoadedFeatures {
    /// Features keyed by id.
    pub index: FeatureIndex,
    /// Every feature file with its canonical text, in path order.
    pub rewrites: RewriteQueue,
    /// Feature lints, in path order.
    pub lints: Vec<Lint>,
}

struct LoadedFeature {
    feature: Feature,
    rewrite: PendingRewrite,
    lints: Vec<LintKind>,
}

/// Loads feature documents.
#[derive(Debug)]
pub struct FeatureLoader<'a> {
    validator: &'a SchemaValidator,
    canonicalizer: GeometryCanonicalizer,
    parallel: bool,
}

impl<'a> FeatureLoader<'a> {
    /// Create a loader.
    pub fn new(validator: &'a SchemaValidator, canonicalizer: GeometryCanonicalizer) -> Self {
        Self {
            validator,
            canonicalizer,
            parallel: true,
        }
    }

    /// Process files on the rayon pool (the default) or sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load the documents at `paths`, which must already be in path order.
    ///
    /// # Errors
    ///
    /// Returns every `Parse`, `Schema`, `Canonicalization`, `Identifier`
    /// and `DuplicateId` error found, in path order. No index is returned
    /// unless all documents loaded.
    pub fn load(&self, paths: &[PathBuf]) -> Result<LoadedFeatures, BuildFailure> {
        let results = map_paths(paths, self.parallel, |path| self.load_one(path));

        let mut loaded = LoadedFeatures::default();
        let mut errors = Vec::new();
        for result in results {
            let one = match result {
                Ok(one) => one,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            for kind in one.lints {
                let lint = Lint {
                    path: one.feature.path.clone(),
                    id: one.feature.id.to_string(),
                    kind,
                };
                warn!(%lint, "feature lint");
                loaded.lints.push(lint);
            }
            if let Err(e) = loaded.index.insert(one.feature) {
                errors.push(e);
                continue;
            }
            loaded.rewrites.push(one.rewrite);
        }

        if let Some(failure) = BuildFailure::from_errors(errors) {
            return Err(failure);
        }
        info!(count = loaded.index.len(), "loaded features");
        Ok(loaded)
    }

    fn load_one(&self, path: &Path) -> Result<LoadedFeature, BuildError> {
        let mut doc = SourceDocument::read(path)?;
        unwrap_single_feature(&mut doc.value);

        let violations = self.validator.violations(DocumentKind::Feature, &doc.value);
        if !violations.is_empty() {
            return Err(BuildError::Schema {
                path: path.to_path_buf(),
                kind: DocumentKind::Feature,
                violations,
            });
        }

        self.canonicalizer
            .canonicalize_document(&mut doc.value)
            .map_err(|source| BuildError::Canonicalization {
                path: path.to_path_buf(),
                source,
            })?;
        order_feature_keys(&mut doc.value);

        let id = doc.id().unwrap_or_default().to_string();
        let id = SourceId::new(id).map_err(|source| BuildError::Identifier {
            path: path.to_path_buf(),
            source,
        })?;

        let rewrite = doc.pending_rewrite()?;
        let lints = lint_feature(&doc.value);
        Ok(LoadedFeature {
            feature: Feature {
                id,
                path: doc.path,
                document: doc.value,
            },
            rewrite,
            lints,
        })
    }
}

/// Replace a `FeatureCollection` of exactly one feature with that feature.
///
/// The collection's `id` is carried over only if the feature has none.
/// Anything else is left for the schema to judge.
pub fn unwrap_single_feature(document: &mut Value) {
    let Some(collection) = document.as_object_mut() else {
        return;
    };
    if collection.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return;
    }
    let Some(Value::Array(features)) = collection.get_mut("features") else {
        return;
    };
    if features.len() != 1 {
        return;
    }
    let mut feature = features.remove(0);
    if let (Some(object), Some(id)) = (feature.as_object_mut(), collection.get("id")) {
        if !object.contains_key("id") {
            object.insert("id".to_string(), id.clone());
        }
    }
    *document = feature;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwrap_transplants_collection_id() {
        let mut doc = json!({
            "type": "FeatureCollection",
            "id": "outer",
            "features": [{"type": "Feature", "properties": {}, "geometry": null}]
        });
        unwrap_single_feature(&mut doc);
        assert_eq!(
            doc,
            json!({"type": "Feature", "properties": {}, "geometry": null, "id": "outer"})
        );
    }

    #[test]
    fn unwrap_keeps_feature_id() {
        let mut doc = json!({
            "type": "FeatureCollection",
            "id": "outer",
            "features": [{"type": "Feature", "id": "inner", "properties": {}}]
        });
        unwrap_single_feature(&mut doc);
        assert_eq!(doc["id"], "inner");
    }

    #[test]
    fn unwrap_ignores_multi_feature_collections() {
        let original = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature"}, {"type": "Feature"}]
        });
        let mut doc = original.clone();
        unwrap_single_feature(&mut doc);
        assert_eq!(doc, original);
    }

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn square(id: &str) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
            }
        })
    }

    #[test]
    fn load_canonicalizes_and_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.geojson", &square("a"));
        let validator = SchemaValidator::bundled().unwrap();
        let loader = FeatureLoader::new(&validator, GeometryCanonicalizer::default());

        let loaded = loader.load(&[a]).unwrap();
        let feature = loaded.index.get("a").unwrap();
        // Clockwise input is rewound counter-clockwise.
        assert_eq!(
            feature.document["geometry"]["coordinates"],
            json!([[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]])
        );
        assert_eq!(loaded.rewrites.len(), 1);
        assert!(loaded.lints.is_empty());
    }

    #[test]
    fn duplicate_ids_name_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.geojson", &square("foo"));
        let b = write(dir.path(), "b.geojson", &square("foo"));
        let validator = SchemaValidator::bundled().unwrap();
        let loader = FeatureLoader::new(&validator, GeometryCanonicalizer::default()).parallel(false);

        let failure = loader.load(&[a.clone(), b.clone()]).unwrap_err();
        assert_eq!(failure.len(), 1);
        match &failure.errors()[0] {
            BuildError::DuplicateId { kind, id, first, second } => {
                assert_eq!(*kind, DocumentKind::Feature);
                assert_eq!(id, "foo");
                assert_eq!(first, &a);
                assert_eq!(second, &b);
            }
            other => panic!("expected DuplicateId, got {other}"),
        }
    }

    #[test]
    fn schema_errors_are_collected_for_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.geojson", &json!({"type": "Feature", "id": "a"}));
        let b = write(dir.path(), "b.geojson", &json!({"type": "Feature", "id": "b", "properties": {}, "extra": 1}));
        let validator = SchemaValidator::bundled().unwrap();
        let loader = FeatureLoader::new(&validator, GeometryCanonicalizer::default());

        let failure = loader.load(&[a.clone(), b.clone()]).unwrap_err();
        let paths: Vec<&PathBuf> = failure
            .errors()
            .iter()
            .map(|e| match e {
                BuildError::Schema { path, .. } => path,
                other => panic!("expected Schema, got {other}"),
            })
            .collect();
        assert_eq!(paths, vec![&a, &b]);
    }
}
