//! # Check Subcommand
//!
//! Runs every load-time check and reports source files that a build would
//! rewrite. Writes nothing; suitable for CI.

use anyhow::Result;
use clap::Args;
use imx_build::{BuildConfig, Mode, Pipeline};

use crate::{report_failure, PathArgs, EXIT_DATASET, EXIT_OK, EXIT_OPERATIONAL};

/// Arguments for `imx check`.
#[derive(Args, Debug, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub paths: PathArgs,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 if everything loads and is canonical, 1 if the
/// dataset fails or a file is not canonical, 2 on operational error.
pub fn run_check(args: &CheckArgs, mut config: BuildConfig) -> Result<u8> {
    args.paths.apply(&mut config);
    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            tracing::error!(class = e.class(), "{e}");
            return Ok(EXIT_OPERATIONAL);
        }
    };

    let report = match pipeline.run(Mode::Check) {
        Ok(report) => report,
        Err(failure) => return Ok(report_failure(&failure)),
    };

    if report.rewritten.is_empty() {
        println!(
            "OK: {} features, {} resources, all canonical",
            report.features, report.resources
        );
        return Ok(EXIT_OK);
    }
    for path in &report.rewritten {
        println!("not canonical: {}", path.display());
    }
    println!(
        "FAIL: {} of {} source files would be rewritten",
        report.rewritten.len(),
        report.rewritten.len() + report.unchanged
    );
    Ok(EXIT_DATASET)
}
