//! # Build Subcommand
//!
//! Loads the whole dataset, rewrites non-canonical sources and writes the
//! aggregate artifacts. Nothing is written if any document fails.

use anyhow::Result;
use clap::Args;
use imx_build::{BuildConfig, Mode, Pipeline};

use crate::{report_failure, PathArgs, EXIT_OK, EXIT_OPERATIONAL};

/// Arguments for `imx build`.
#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

/// Execute the build subcommand.
///
/// Returns exit code: 0 on success, 1 if the dataset does not build,
/// 2 on operational error.
pub fn run_build(args: &BuildArgs, mut config: BuildConfig) -> Result<u8> {
    args.paths.apply(&mut config);
    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(class = e.class(), "{e}");
            return Ok(EXIT_OPERATIONAL);
        }
    };

    match pipeline.run(Mode::Build) {
        Ok(report) => {
            for path in &report.rewritten {
                println!("rewrote {}", path.display());
            }
            println!(
                "{} features, {} resources, {} i18n entries; {} sources rewritten, {} artifacts written, {} lints",
                report.features,
                report.resources,
                report.i18n_entries,
                report.rewritten.len(),
                report.artifacts_written.len(),
                report.lints.len(),
            );
            Ok(EXIT_OK)
        }
        Err(failure) => Ok(report_failure(&failure)),
    }
}
