//! # Resource Loader
//!
//! Loads every resource document and checks it against the loaded
//! features. Per document, in order:
//!
//! 1. strict parse and schema validation (independent per file, may run
//!    on the rayon pool);
//! 2. duplicate id;
//! 3. deprecated zoom token in the URL;
//! 4. feature reference: `featureId` must resolve, and may only be absent
//!    for world-scoped resources or an exempt `type`;
//! 5. translation strings and lints.
//!
//! Steps 2-5 run sequentially in path order. A document stops at its
//! first error; later documents are still checked so that one build
//! reports everything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use imx_core::SourceId;
use imx_schema::{DocumentKind, SchemaValidator};
use serde_json::Value;
use tracing::{info, warn};

use crate::document::{map_paths, SourceDocument};
use crate::error::{BuildError, BuildFailure};
use crate::features::FeatureIndex;
use crate::i18n::I18nBundle;
use crate::lint::{lint_resource, Lint};
use crate::rewrite::{PendingRewrite, RewriteQueue};

/// Resource types allowed to omit `featureId` without being world-scoped.
///
/// Bing's coverage is served by its own metadata endpoint rather than a
/// boundary in this dataset.
pub const FEATURE_ID_EXEMPT_TYPES: &[&str] = &["bing"];

/// Zoom token that must no longer appear in URL templates.
pub const DEPRECATED_ZOOM_TOKEN: &str = "{z}";

/// Zoom token URL templates use instead.
pub const ZOOM_TOKEN: &str = "{zoom}";

/// Path component (or file stem) marking a resource as world-scoped.
pub const WORLD_SCOPE: &str = "world";

/// A loaded resource.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The resource's id.
    pub id: SourceId,
    /// File it was loaded from.
    pub path: PathBuf,
    /// The `type` member.
    pub resource_type: String,
    /// The resolved feature reference, if any.
    pub feature_id: Option<SourceId>,
    /// Whether the file lives in the world scope.
    pub world_scoped: bool,
    /// The document as parsed.
    pub document: Value,
}

/// Resources keyed by id, in byte-wise id order.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    resources: BTreeMap<SourceId, Resource>,
}

impl ResourceIndex {
    /// Look up a resource.
    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Returns the number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no resource was loaded.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }
}

/// Everything the resource stage hands on.
#[derive(Debug, Default)]
pub struct LoadedResources {
    /// Resources keyed by id.
    pub index: ResourceIndex,
    /// Strings of the resources flagged for translation.
    pub i18n: I18nBundle,
    /// Every resource file with its canonical text, in path order.
    pub rewrites: RewriteQueue,
    /// Resource lints, in path order.
    pub lints: Vec<Lint>,
}

struct ParsedResource {
    id: SourceId,
    rewrite: PendingRewrite,
    doc: SourceDocument,
}

/// Loads resource documents.
#[derive(Debug)]
pub struct ResourceLoader<'a> {
    validator: &'a SchemaValidator,
    resources_root: PathBuf,
    parallel: bool,
}

impl<'a> ResourceLoader<'a> {
    /// Create a loader for documents under `resources_root`.
    pub fn new(validator: &'a SchemaValidator, resources_root: impl Into<PathBuf>) -> Self {
        Self {
            validator,
            resources_root: resources_root.into(),
            parallel: true,
        }
    }

    /// Process files on the rayon pool (the default) or sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load the documents at `paths` (already in path order), resolving
    /// feature references against `features`.
    ///
    /// # Errors
    ///
    /// Returns every error found, in path order.
    pub fn load(&self, paths: &[PathBuf], features: &FeatureIndex) -> Result<LoadedResources, BuildFailure> {
        let results = map_paths(paths, self.parallel, |path| self.parse_one(path));

        let mut loaded = LoadedResources::default();
        // Every schema-valid id, including those of documents that later
        // fail a reference or token check.
        let mut seen: BTreeMap<SourceId, PathBuf> = BTreeMap::new();
        let mut errors = Vec::new();
        for result in results {
            match result.and_then(|parsed| self.admit(parsed, features, &mut seen, &mut loaded)) {
                Ok(()) => {}
                Err(e) => errors.push(e),
            }
        }

        if let Some(failure) = BuildFailure::from_errors(errors) {
            return Err(failure);
        }
        info!(
            count = loaded.index.len(),
            i18n_entries = loaded.i18n.len(),
            "loaded resources"
        );
        Ok(loaded)
    }

    fn parse_one(&self, path: &Path) -> Result<ParsedResource, BuildError> {
        let doc = SourceDocument::read(path)?;
        let violations = self.validator.violations(DocumentKind::Resource, &doc.value);
        if !violations.is_empty() {
            return Err(BuildError::Schema {
                path: path.to_path_buf(),
                kind: DocumentKind::Resource,
                violations,
            });
        }
        let id = SourceId::new(doc.id().unwrap_or_default()).map_err(|source| BuildError::Identifier {
            path: path.to_path_buf(),
            source,
        })?;
        let rewrite = doc.pending_rewrite()?;
        Ok(ParsedResource { id, rewrite, doc })
    }

    fn admit(
        &self,
        parsed: ParsedResource,
        features: &FeatureIndex,
        seen: &mut BTreeMap<SourceId, PathBuf>,
        loaded: &mut LoadedResources,
    ) -> Result<(), BuildError> {
        let ParsedResource { id, rewrite, doc } = parsed;
        let path = doc.path;
        let document = doc.value;

        if let Some(first) = seen.get(&id) {
            return Err(BuildError::DuplicateId {
                kind: DocumentKind::Resource,
                id: id.to_string(),
                first: first.clone(),
                second: path,
            });
        }
        seen.insert(id.clone(), path.clone());

        let url = document.get("url").and_then(Value::as_str).unwrap_or_default();
        if url.contains(DEPRECATED_ZOOM_TOKEN) {
            return Err(BuildError::BadToken {
                path,
                id: id.to_string(),
                found: DEPRECATED_ZOOM_TOKEN,
                expected: ZOOM_TOKEN,
            });
        }

        let resource_type = document
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let world_scoped = is_world_scoped(&self.resources_root, &path);
        let feature_id = match document.get("featureId").and_then(Value::as_str) {
            Some(reference) => {
                if !features.contains(reference) {
                    return Err(BuildError::UnresolvedFeature {
                        path,
                        id: id.to_string(),
                        feature_id: reference.to_string(),
                    });
                }
                let reference = SourceId::new(reference).map_err(|source| BuildError::Identifier {
                    path: path.clone(),
                    source,
                })?;
                Some(reference)
            }
            None => {
                if !world_scoped && !FEATURE_ID_EXEMPT_TYPES.contains(&resource_type.as_str()) {
                    return Err(BuildError::MissingFeatureId {
                        path,
                        id: id.to_string(),
                        resource_type,
                    });
                }
                None
            }
        };

        loaded.i18n.collect(&id, &document);
        for kind in lint_resource(&document) {
            let lint = Lint {
                path: path.clone(),
                id: id.to_string(),
                kind,
            };
            warn!(%lint, "resource lint");
            loaded.lints.push(lint);
        }
        loaded.rewrites.push(rewrite);
        loaded.index.resources.insert(
            id.clone(),
            Resource {
                id,
                path,
                resource_type,
                feature_id,
                world_scoped,
                document,
            },
        );
        Ok(())
    }
}

/// True if a directory between `root` and `path`, or the file stem of
/// `path`, is named `world`.
pub fn is_world_scoped(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut components: Vec<&std::ffi::OsStr> = relative.iter().collect();
    let Some(last) = components.pop() else {
        return false;
    };
    let stem = Path::new(last).file_stem();
    components.into_iter().chain(stem).any(|c| c == WORLD_SCOPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_scope_from_directory_or_stem() {
        let root = Path::new("resources");
        assert!(is_world_scoped(root, Path::new("resources/world/bing.json")));
        assert!(is_world_scoped(root, Path::new("resources/world.json")));
        assert!(is_world_scoped(root, Path::new("resources/world/sub/x.json")));
        assert!(!is_world_scoped(root, Path::new("resources/europe/worldwide.json")));
        assert!(!is_world_scoped(root, Path::new("resources/europe/de/x.json")));
    }

    #[test]
    fn root_named_world_does_not_count() {
        let root = Path::new("/data/world/resources");
        assert!(!is_world_scoped(root, Path::new("/data/world/resources/europe/x.json")));
    }

    #[test]
    fn exemption_list_is_narrow() {
        assert_eq!(FEATURE_ID_EXEMPT_TYPES, &["bing"]);
    }
}
