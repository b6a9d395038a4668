//! Inference runner CLI

use super::config::CliConfigBuilder;
use crate::{
    config::PredictRequest, device, processor::ClassificationProcessor,
    tracing_config::TracingFormat, utils::ExecutionProviderManager,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;

/// Classify one image with a trained model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "labelvision-predict")]
pub struct PredictCli {
    /// JSON request: {"model_dir": "...", "image_path": "..."}
    #[arg(value_name = "REQUEST", required_unless_present = "show_providers")]
    pub request: Option<String>,

    /// Backend in format backend[:provider] (e.g., tract, onnx:auto, onnx:cuda)
    #[arg(short, long, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Input tensor layout expected by the model
    #[arg(long, default_value = "nhwc", value_name = "LAYOUT")]
    pub layout: String,

    /// Show backend and execution provider diagnostics and exit
    #[arg(long)]
    pub show_providers: bool,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Format of the log lines written to stderr
    #[arg(long, value_enum, default_value_t = TracingFormat::Compact, value_name = "FORMAT")]
    pub log_format: TracingFormat,
}

#[must_use]
pub fn main() -> ExitCode {
    let cli = match super::parse_args::<PredictCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    super::init_tracing(cli.verbose, cli.log_format);

    if cli.show_providers {
        show_provider_diagnostics();
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => super::report_failure(&e),
    }
}

fn run(cli: &PredictCli) -> Result<()> {
    let raw = cli
        .request
        .as_deref()
        .context("A JSON request argument is required")?;
    let request = PredictRequest::from_json_arg(raw).context("Invalid request")?;

    let mut devices = device::list_physical_devices();
    let configured = device::enable_memory_growth(&mut devices);
    if configured > 0 {
        info!(devices = configured, "Enabled memory growth on accelerators");
    }

    let config = CliConfigBuilder::from_cli(cli, devices).context("Failed to build configuration")?;
    info!(
        backend = %config.backend_type,
        provider = %config.execution_provider,
        "Selected inference backend"
    );

    let mut processor =
        ClassificationProcessor::new(config).context("Failed to create inference backend")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = processor
        .predict(&request, &mut out)
        .context("Prediction failed")?;
    result.write_report(&mut out)?;
    writeln!(out, "{}", result.summary_line())?;
    out.flush()?;
    Ok(())
}

fn show_provider_diagnostics() {
    println!("Backend and Execution Provider Diagnostics");
    println!();

    println!("Execution providers:");
    for provider in ExecutionProviderManager::list_all_providers() {
        let status = if provider.available {
            "available"
        } else {
            "not available"
        };
        println!("  {}: {} - {}", provider.name, status, provider.description);
    }

    let devices = device::list_physical_devices();
    println!();
    if devices.is_empty() {
        println!("Accelerators: none detected");
    } else {
        println!("Accelerators:");
        for device in &devices {
            println!("  {device}");
        }
    }

    println!();
    println!("Select with --backend or {}", crate::utils::BACKEND_ENV_VAR);
}
