//! Dataset placeholder generator CLI

use crate::{
    collector::{DatasetCollector, PlaceholderSource},
    config::CollectRequest,
    tracing_config::TracingFormat,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{info, warn};

/// Create per-label dataset directories filled with placeholder images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "labelvision-collect")]
pub struct CollectCli {
    /// JSON request: {"labels": [...], "output_dir": "...", "max_images": n}
    #[arg(value_name = "REQUEST")]
    pub request: String,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Format of the log lines written to stderr
    #[arg(long, value_enum, default_value_t = TracingFormat::Compact, value_name = "FORMAT")]
    pub log_format: TracingFormat,
}

#[must_use]
pub fn main() -> ExitCode {
    let cli = match super::parse_args::<CollectCli>() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    super::init_tracing(cli.verbose, cli.log_format);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => super::report_failure(&e),
    }
}

fn run(cli: &CollectCli) -> Result<()> {
    let request = CollectRequest::from_json_arg(&cli.request).context("Invalid request")?;
    let source = PlaceholderSource::new();
    if !source.has_font() {
        info!("No usable font, placeholders will carry no label text");
    }
    let mut collector = DatasetCollector::from_request(source, &request);
    info!(
        labels = request.labels.len(),
        output_dir = %collector.output_dir().display(),
        per_label = collector.images_per_label(),
        "Starting collection"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = collector
        .run(&request.labels, &mut out)
        .context("Failed to write progress output")?;
    out.flush()?;

    if summary.all_succeeded() {
        info!(labels = summary.succeeded.len(), "Collection finished");
    } else {
        warn!(
            succeeded = summary.succeeded.len(),
            failed = ?summary.failed,
            "Collection finished with failed labels"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_and_verbosity() {
        let cli = CollectCli::try_parse_from(["labelvision-collect", "-vv", r#"{"labels":[]}"#])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.request, r#"{"labels":[]}"#);
        assert_eq!(cli.log_format, TracingFormat::Compact);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = CollectCli::try_parse_from([
            "labelvision-collect",
            "--log-format",
            "console",
            r#"{"labels":[]}"#,
        ])
        .unwrap();
        assert_eq!(cli.log_format, TracingFormat::Console);

        let cli = CollectCli::try_parse_from(["labelvision-collect", "--log-format", "json", "{}"])
            .unwrap();
        assert_eq!(cli.log_format, TracingFormat::Json);

        let unknown = ["labelvision-collect", "--log-format", "xml", "{}"];
        assert!(CollectCli::try_parse_from(unknown).is_err());
    }

    #[test]
    fn test_positional_argument_count() {
        assert!(CollectCli::try_parse_from(["labelvision-collect"]).is_err());
        assert!(CollectCli::try_parse_from(["labelvision-collect", "{}", "{}"]).is_err());
    }

    #[test]
    fn test_malformed_request_is_rejected() {
        let cli = CollectCli {
            request: "{labels".to_string(),
            verbose: 0,
            log_format: TracingFormat::Compact,
        };
        let err = run(&cli).unwrap_err();
        assert!(format!("{err:?}").contains("Malformed collect request"));
    }
}
