//! # Build Pipeline
//!
//! Sequences discovery, feature loading, resource loading, source
//! rewriting and artifact emission. Each stage either hands its result
//! to the next or returns a [`BuildFailure`]; nothing is rewritten or
//! emitted once a stage has failed.

use std::path::PathBuf;

use imx_schema::SchemaValidator;
use tracing::info;

use crate::config::BuildConfig;
use crate::discover::discover_documents;
use crate::emit::{render, write_artifacts, EmitTarget};
use crate::error::{BuildError, BuildFailure};
use crate::features::FeatureLoader;
use crate::lint::Lint;
use crate::resources::ResourceLoader;
use crate::rewrite::{check_sources, rewrite_sources, RewriteQueue};

/// What a run does after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rewrite non-canonical sources and write the artifacts.
    Build,
    /// Only report non-canonical sources. Writes nothing.
    Check,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Number of features loaded.
    pub features: usize,
    /// Number of resources loaded.
    pub resources: usize,
    /// Number of resources that contributed translation strings.
    pub i18n_entries: usize,
    /// Source files rewritten (`Build`) or needing a rewrite (`Check`).
    pub rewritten: Vec<PathBuf>,
    /// Source files already canonical.
    pub unchanged: usize,
    /// Artifacts whose content changed. Always empty in `Check` mode.
    pub artifacts_written: Vec<PathBuf>,
    /// Non-fatal findings, features first, each in path order.
    pub lints: Vec<Lint>,
}

/// A configured build.
#[derive(Debug)]
pub struct Pipeline {
    config: BuildConfig,
    validator: SchemaValidator,
}

impl Pipeline {
    /// Validate `config` and load the schemas it names.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Config` for an invalid configuration and
    /// `BuildError::Schemas` if the schemas cannot be loaded.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        let validator = match &config.schema_dir {
            Some(dir) => SchemaValidator::from_dir(dir),
            None => SchemaValidator::bundled(),
        }
        .map_err(BuildError::Schemas)?;
        Ok(Self { config, validator })
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Returns the `BuildFailure` of the first stage that failed.
    pub fn run(&self, mode: Mode) -> Result<BuildReport, BuildFailure> {
        let config = &self.config;

        let feature_paths = discover_documents(&config.features_dir, &config.feature_extensions)?;
        let resource_paths = discover_documents(&config.resources_dir, &config.resource_extensions)?;
        info!(
            features = feature_paths.len(),
            resources = resource_paths.len(),
            "discovered documents"
        );

        let features = FeatureLoader::new(&self.validator, config.canonicalizer())
            .parallel(config.parallel)
            .load(&feature_paths)?;
        let resources = ResourceLoader::new(&self.validator, &config.resources_dir)
            .parallel(config.parallel)
            .load(&resource_paths, &features.index)?;

        let mut queue = RewriteQueue::default();
        queue.extend(features.rewrites);
        queue.extend(resources.rewrites);

        let mut report = BuildReport {
            features: features.index.len(),
            resources: resources.index.len(),
            i18n_entries: resources.i18n.len(),
            lints: features.lints,
            ..BuildReport::default()
        };
        report.lints.extend(resources.lints);

        match mode {
            Mode::Check => {
                let checked = check_sources(&queue);
                report.rewritten = checked.rewritten;
                report.unchanged = checked.unchanged;
                info!(
                    non_canonical = report.rewritten.len(),
                    canonical = report.unchanged,
                    "checked sources"
                );
            }
            Mode::Build => {
                let target = EmitTarget {
                    dist_dir: &config.dist_dir,
                    i18n_path: &config.i18n_path,
                    locale: &config.locale,
                    namespace: &config.namespace,
                };
                let artifacts = render(&features.index, &resources.index, &resources.i18n, &target)?;

                let rewritten = rewrite_sources(&queue)?;
                info!(
                    rewritten = rewritten.rewritten.len(),
                    unchanged = rewritten.unchanged,
                    "rewrote sources"
                );
                report.rewritten = rewritten.rewritten;
                report.unchanged = rewritten.unchanged;

                let emitted = write_artifacts(&artifacts)?;
                info!(
                    written = emitted.written.len(),
                    unchanged = emitted.unchanged,
                    "emitted artifacts"
                );
                report.artifacts_written = emitted.written;
            }
        }
        Ok(report)
    }
}
