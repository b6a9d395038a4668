//! Shared utilities for preprocessing and backend selection

pub mod preprocessing;
pub mod providers;

pub use preprocessing::{ImagePreprocessor, PreprocessingOptions};
pub use providers::{ExecutionProviderManager, ProviderInfo, BACKEND_ENV_VAR};
