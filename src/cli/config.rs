//! Configuration conversion utilities for CLI arguments

use crate::cli::PredictCli;
use crate::{
    config::{PredictConfig, TensorLayout},
    device::AcceleratorDevice,
    utils::ExecutionProviderManager,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to `PredictConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `PredictConfig` from CLI arguments and the prepared devices
    pub(crate) fn from_cli(
        cli: &PredictCli,
        devices: Vec<AcceleratorDevice>,
    ) -> Result<PredictConfig> {
        let (backend_type, execution_provider) =
            ExecutionProviderManager::resolve(cli.backend.as_deref())
                .context("Invalid backend selection")?;

        let layout: TensorLayout = cli.layout.parse().context("Invalid tensor layout")?;

        PredictConfig::builder()
            .backend_type(backend_type)
            .execution_provider(execution_provider)
            .layout(layout)
            .devices(devices)
            .build()
            .context("Invalid configuration")
    }
}
