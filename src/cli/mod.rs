//! Command-line front ends of the two binaries
//!
//! This module is only available when the "cli" feature is enabled.

mod collect;
mod config;
mod predict;

pub use collect::{main as collect_main, CollectCli};
pub use predict::{main as predict_main, PredictCli};

use clap::Parser;
use std::process::ExitCode;

/// Parse process arguments, mapping usage errors to exit status 1
///
/// `--help` and `--version` print and exit successfully.
fn parse_args<T: Parser>() -> Result<T, ExitCode> {
    T::try_parse().map_err(|e| {
        let _ = e.print();
        if e.use_stderr() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

fn init_tracing(verbose: u8, format: crate::tracing_config::TracingFormat) {
    // A second subscriber (e.g. under a test harness) is not fatal
    if let Err(e) = crate::tracing_config::init_cli_tracing(verbose, format) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }
}

fn report_failure(error: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {error:?}");
    ExitCode::FAILURE
}
