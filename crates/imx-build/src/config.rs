//! # Build Configuration
//!
//! All knobs of a build in one `serde` struct. Values come from an
//! optional YAML file; the CLI overrides individual fields afterwards.
//!
//! ```yaml
//! features_dir: features
//! resources_dir: resources
//! dist_dir: dist
//! i18n_path: i18n/en.yaml
//! precision: 5
//! winding: rfc7946
//! ```

use std::path::{Path, PathBuf};

use imx_core::precision::MAX_PRECISION;
use imx_core::{GeometryCanonicalizer, Winding, DEFAULT_PRECISION};
use serde::Deserialize;

use crate::error::BuildError;

/// Default configuration filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "imx.yaml";

/// Configuration of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Root of the feature document tree.
    pub features_dir: PathBuf,
    /// Root of the resource document tree.
    pub resources_dir: PathBuf,
    /// Directory receiving the aggregate JSON artifacts.
    pub dist_dir: PathBuf,
    /// Path of the localization extract.
    pub i18n_path: PathBuf,
    /// Load schemas from this directory instead of the bundled copies.
    pub schema_dir: Option<PathBuf>,
    /// Top-level key of the localization extract.
    pub locale: String,
    /// Second-level key of the localization extract.
    pub namespace: String,
    /// Decimal digits kept in coordinates.
    pub precision: u32,
    /// Ring orientation convention.
    pub winding: Winding,
    /// File extensions recognised under `features_dir`.
    pub feature_extensions: Vec<String>,
    /// File extensions recognised under `resources_dir`.
    pub resource_extensions: Vec<String>,
    /// Parse, canonicalize and validate files on the rayon pool.
    pub parallel: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            features_dir: PathBuf::from("features"),
            resources_dir: PathBuf::from("resources"),
            dist_dir: PathBuf::from("dist"),
            i18n_path: PathBuf::from("i18n/en.yaml"),
            schema_dir: None,
            locale: "en".to_string(),
            namespace: "imagery".to_string(),
            precision: DEFAULT_PRECISION,
            winding: Winding::default(),
            feature_extensions: vec!["geojson".to_string(), "json".to_string()],
            resource_extensions: vec!["json".to_string()],
            parallel: true,
        }
    }
}

impl BuildConfig {
    /// Load configuration from a YAML file. Missing keys take defaults.
    ///
    /// Relative paths in the file are resolved against the file's
    /// directory, so a config can be used from any working directory.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Io` if the file cannot be read and
    /// `BuildError::Config` if it is not valid configuration YAML.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let mut config = Self::from_yaml(&text)
            .map_err(|e| BuildError::Config(format!("{}: {e}", path.display())))?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.rebase(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without resolving paths.
    ///
    /// # Errors
    ///
    /// Returns the serde_yaml error for unknown keys or mistyped values.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Config` describing the first bad value.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.precision > MAX_PRECISION {
            return Err(BuildError::Config(format!(
                "precision {} exceeds the maximum of {MAX_PRECISION}",
                self.precision
            )));
        }
        if self.locale.is_empty() || self.namespace.is_empty() {
            return Err(BuildError::Config(
                "locale and namespace must not be empty".to_string(),
            ));
        }
        if self.feature_extensions.is_empty() || self.resource_extensions.is_empty() {
            return Err(BuildError::Config(
                "at least one file extension is required per collection".to_string(),
            ));
        }
        Ok(())
    }

    /// The geometry canonicalizer this configuration describes.
    pub fn canonicalizer(&self) -> GeometryCanonicalizer {
        GeometryCanonicalizer::new(self.precision, self.winding)
    }

    fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.features_dir,
            &mut self.resources_dir,
            &mut self.dist_dir,
            &mut self.i18n_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if let Some(dir) = self.schema_dir.as_mut().filter(|d| d.is_relative()) {
            *dir = base.join(&*dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.precision, 5);
        assert_eq!(config.winding, Winding::Rfc7946);
        assert_eq!(config.locale, "en");
        assert_eq!(config.namespace, "imagery");
        assert!(config.parallel);
        config.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = BuildConfig::from_yaml("dist_dir: out\nwinding: clockwise\n").unwrap();
        assert_eq!(config.dist_dir, PathBuf::from("out"));
        assert_eq!(config.winding, Winding::Clockwise);
        assert_eq!(config.features_dir, PathBuf::from("features"));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(BuildConfig::from_yaml("").unwrap(), BuildConfig::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(BuildConfig::from_yaml("dist: out\n").is_err());
    }

    #[test]
    fn precision_is_range_checked() {
        let config = BuildConfig {
            precision: 16,
            ..BuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(BuildError::Config(_))));
    }

    #[test]
    fn load_resolves_relative_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imx.yaml");
        std::fs::write(&path, "features_dir: data/features\nschema_dir: schemas\n").unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.features_dir, dir.path().join("data/features"));
        assert_eq!(config.resources_dir, dir.path().join("resources"));
        assert_eq!(config.schema_dir, Some(dir.path().join("schemas")));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BuildConfig::load(&dir.path().join("nope.yaml")),
            Err(BuildError::Io { .. })
        ));
    }
}
