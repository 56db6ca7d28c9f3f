//! # imx-cli — The `imx` Command
//!
//! ```bash
//! imx build                  # rewrite sources, write dist/ and the i18n extract
//! imx check                  # report non-canonical sources, write nothing
//! imx -vv build --dist out   # debug logging, override one path
//! ```
//!
//! ## Exit Codes
//!
//! - `0` success.
//! - `1` the dataset failed to build, or `check` found non-canonical files.
//! - `2` operational error: unreadable configuration, schemas or directories.

pub mod build;
pub mod check;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use imx_build::{BuildConfig, BuildFailure, DEFAULT_CONFIG_FILE};

/// Exit code for success.
pub const EXIT_OK: u8 = 0;
/// Exit code for a dataset that does not build (or is not canonical).
pub const EXIT_DATASET: u8 = 1;
/// Exit code for operational errors.
pub const EXIT_OPERATIONAL: u8 = 2;

/// Path overrides shared by `build` and `check`.
#[derive(Args, Debug, Default, Clone)]
pub struct PathArgs {
    /// Feature document directory.
    #[arg(long, value_name = "DIR")]
    pub features: Option<PathBuf>,

    /// Resource document directory.
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,

    /// Output directory for the aggregate artifacts.
    #[arg(long, value_name = "DIR")]
    pub dist: Option<PathBuf>,

    /// Output path of the localization extract.
    #[arg(long, value_name = "FILE")]
    pub i18n: Option<PathBuf>,

    /// Load schemas from this directory instead of the bundled copies.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,
}

impl PathArgs {
    /// Apply the overrides given on the command line.
    pub fn apply(&self, config: &mut BuildConfig) {
        if let Some(dir) = &self.features {
            config.features_dir = dir.clone();
        }
        if let Some(dir) = &self.resources {
            config.resources_dir = dir.clone();
        }
        if let Some(dir) = &self.dist {
            config.dist_dir = dir.clone();
        }
        if let Some(path) = &self.i18n {
            config.i18n_path = path.clone();
        }
        if let Some(dir) = &self.schemas {
            config.schema_dir = Some(dir.clone());
        }
    }
}

/// Find the configuration to use.
///
/// An explicit `--config` file must exist. Without one, `imx.yaml` in
/// `working_dir` is used if present, defaults otherwise.
///
/// # Errors
///
/// Fails if the chosen file cannot be read or is not valid configuration.
pub fn resolve_config(explicit: Option<&Path>, working_dir: &Path) -> Result<BuildConfig> {
    let path = match explicit {
        Some(path) if !path.exists() => bail!("config file not found: {}", path.display()),
        Some(path) => path.to_path_buf(),
        None => {
            let default = working_dir.join(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                tracing::debug!("no {DEFAULT_CONFIG_FILE} found; using defaults");
                return Ok(BuildConfig::default());
            }
            default
        }
    };
    tracing::debug!(path = %path.display(), "loading configuration");
    BuildConfig::load(&path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Log every error of a failed build and pick the exit code.
pub fn report_failure(failure: &BuildFailure) -> u8 {
    for error in failure.errors() {
        tracing::error!(class = error.class(), "{error}");
    }
    eprintln!("{failure}");
    if failure.is_dataset_failure() {
        EXIT_DATASET
    } else {
        EXIT_OPERATIONAL
    }
}
