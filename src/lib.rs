#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # labelvision
//!
//! Two helpers of an image-classification workflow:
//!
//! - a **dataset placeholder generator** that creates one directory per label
//!   and fills it with 224×224 placeholder JPEGs, behind an [`ImageSource`]
//!   seam where a real image search can be plugged in;
//! - an **inference runner** that loads a trained classifier from a model
//!   directory, preprocesses one image to a `(1, 224, 224, 3)` tensor in
//!   `[0, 1]`, runs a forward pass and reports the top class together with
//!   the full per-class distribution.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labelvision::{classify_image, PredictConfig};
//!
//! # fn example() -> labelvision::Result<()> {
//! let result = classify_image("models/flowers", "rose.jpg", PredictConfig::default())?;
//! println!("{}", result.summary_line());
//! # Ok(())
//! # }
//! ```
//!
//! A model directory holds `best_model.onnx` (or `final_model.onnx`) and
//! `class_names.json`, a JSON object mapping stringified indices to names.
//!
//! ### Feature Flags
//!
//! - `tract` (default): pure Rust CPU backend
//! - `onnx`: ONNX Runtime backend with CUDA and `CoreML` providers
//! - `cli` (default): the `labelvision-collect` and `labelvision-predict` binaries
//! - `webp-support` (default): WebP input images
//! - `tracing-json`: JSON log output for the binaries

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod inference;
pub mod models;
pub mod processor;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

#[cfg(feature = "onnx")]
pub use backends::OnnxBackend;
#[cfg(feature = "tract")]
pub use backends::TractBackend;
pub use collector::{CollectSummary, DatasetCollector, ImageSource, PlaceholderSource};
pub use config::{
    BackendType, CollectRequest, ExecutionProvider, PredictConfig, PredictConfigBuilder,
    PredictRequest, TensorLayout, MAX_IMAGES_PER_LABEL, TARGET_SIZE,
};
pub use device::{enable_memory_growth, list_physical_devices, AcceleratorDevice, DeviceKind};
pub use error::{ClassifyError, Result};
pub use inference::InferenceBackend;
pub use models::{ClassNameTable, ModelArtifact, ModelFormat};
pub use processor::{BackendFactory, ClassificationProcessor, DefaultBackendFactory};
pub use types::{ClassConfidence, PredictionResult};
pub use utils::{ExecutionProviderManager, ImagePreprocessor, PreprocessingOptions, ProviderInfo};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

use std::path::Path;

/// Classify one image with the model stored in `model_dir`
///
/// Progress lines are discarded; use [`ClassificationProcessor`] to receive them.
pub fn classify_image<P: AsRef<Path>, Q: AsRef<Path>>(
    model_dir: P,
    image_path: Q,
    config: PredictConfig,
) -> Result<PredictionResult> {
    let mut processor = ClassificationProcessor::new(config)?;
    processor.predict_paths(model_dir.as_ref(), image_path.as_ref(), &mut std::io::sink())
}

/// Generate placeholder images for every label of the request
///
/// Progress lines are written to `out`. Per-label failures are reported there
/// and collected in the summary.
pub fn generate_placeholder_dataset<W: std::io::Write>(
    request: &CollectRequest,
    out: &mut W,
) -> Result<CollectSummary> {
    DatasetCollector::from_request(PlaceholderSource::new(), request).run(&request.labels, out)
}
