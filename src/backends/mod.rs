//! Backend implementations for different inference engines
//!
//! - Tract backend (pure Rust, CPU only, default)
//! - ONNX Runtime backend (GPU acceleration, optional)

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "tract")]
pub mod tract;

// Test utilities for backend testing
#[cfg(test)]
pub mod test_utils;

#[cfg(feature = "onnx")]
pub use self::onnx::OnnxBackend;

#[cfg(feature = "tract")]
pub use self::tract::TractBackend;

use crate::config::{BackendType, PredictConfig};
use crate::error::{ClassifyError, Result};
use crate::inference::InferenceBackend;

/// Instantiate the backend selected by the configuration
pub fn create_backend(config: &PredictConfig) -> Result<Box<dyn InferenceBackend>> {
    match config.backend_type {
        #[cfg(feature = "tract")]
        BackendType::Tract => Ok(Box::new(TractBackend::new())),
        #[cfg(feature = "onnx")]
        BackendType::Onnx => Ok(Box::new(OnnxBackend::new())),
        #[allow(unreachable_patterns)]
        other => Err(ClassifyError::invalid_config(format!(
            "Backend '{other}' is not compiled in; rebuild with --features {other}"
        ))),
    }
}
