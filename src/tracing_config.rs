//! Tracing configuration for the command-line binaries
//!
//! Applications configure the subscriber, the library only emits events.
//! Everything goes to stderr: stdout carries the output other programs parse.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Configuration for tracing output format, selected with `--log-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TracingFormat {
    /// Human-readable output with colors
    Console,
    /// Plain compact output for CI and captured logs
    #[default]
    Compact,
    /// JSON structured logging, needs the `tracing-json` feature
    Json,
}

/// Tracing configuration builder
#[derive(Debug)]
pub struct TracingConfig {
    /// Verbosity level (maps to log levels)
    pub verbosity: u8,
    pub format: TracingFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            format: TracingFormat::Compact,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity level (0-3+)
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Convert verbosity level to tracing filter string
    #[must_use]
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",  // Default: keep stderr quiet
            1 => "info",  // -v: pipeline stages
            2 => "debug", // -vv: internal state
            _ => "trace", // -vvv+: everything
        }
    }

    /// `RUST_LOG` when set, the verbosity level otherwise
    fn build_filter(&self, rust_log: Option<&str>) -> anyhow::Result<EnvFilter> {
        let directive = rust_log
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(self.verbosity_to_filter());
        Ok(EnvFilter::try_new(directive)?)
    }

    /// Install the global subscriber
    ///
    /// # Errors
    /// Invalid filter directives, or a subscriber already installed.
    pub fn init(self) -> anyhow::Result<()> {
        use tracing_subscriber::fmt;

        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let registry = Registry::default().with(self.build_filter(rust_log.as_deref())?);

        match self.format {
            TracingFormat::Console => {
                let fmt_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_level(true)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            TracingFormat::Compact => {
                let fmt_layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(false)
                    .compact();
                registry.with(fmt_layer).try_init()?;
            },
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => {
                let fmt_layer = fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true);
                registry.with(fmt_layer).try_init()?;
            },
            #[cfg(not(feature = "tracing-json"))]
            TracingFormat::Json => {
                anyhow::bail!("JSON log output requires the 'tracing-json' feature")
            },
        }

        Ok(())
    }
}

/// Initialize tracing from the `-v` count and `--log-format` of a binary
///
/// # Errors
/// See [`TracingConfig::init`].
pub fn init_cli_tracing(verbosity: u8, format: TracingFormat) -> anyhow::Result<()> {
    TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .init()
}
