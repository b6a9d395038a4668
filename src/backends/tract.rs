//! Tract backend implementation for classification models
//!
//! Runs ONNX classifiers with Tract, a pure Rust inference engine. The input
//! fact is pinned to the configured batch shape before optimization, so
//! exports with a symbolic batch dimension load without extra steps.

use crate::config::PredictConfig;
use crate::error::{ClassifyError, Result};
use crate::inference::{to_class_matrix, InferenceBackend};
use crate::models::ModelArtifact;
use log;
use ndarray::{Array2, Array4};
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant crate for cross-platform time compatibility
use instant::{Duration, Instant};

/// Tract backend for running classifiers using pure Rust inference
#[derive(Debug)]
pub struct TractBackend {
    model: Option<TractModel>,
    input_shape: (usize, usize, usize, usize),
    initialized: bool,
}

impl TractBackend {
    /// Create a new uninitialized Tract backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: None,
            input_shape: (1, 224, 224, 3),
            initialized: false,
        }
    }

    /// Parse, pin and optimize an ONNX graph
    fn build_model(model_data: &[u8], shape: (usize, usize, usize, usize)) -> Result<TractModel> {
        let (n, d1, d2, d3) = shape;

        onnx()
            .model_for_read(&mut std::io::Cursor::new(model_data))
            .map_err(|e| ClassifyError::model(format!("Failed to load ONNX model: {e}")))?
            .with_input_fact(0, f32::fact([n, d1, d2, d3]).into())
            .map_err(|e| ClassifyError::model(format!("Failed to set input shape: {e}")))?
            .into_optimized()
            .map_err(|e| ClassifyError::model(format!("Failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| ClassifyError::model(format!("Failed to create runnable model: {e}")))
    }

    fn load_model(&mut self, artifact: &ModelArtifact, config: &PredictConfig) -> Result<Duration> {
        let model_load_start = Instant::now();

        let model_data = artifact.load()?;

        log::info!("Initializing Tract backend");
        log::info!("  - Model: {}", artifact.name());
        log::info!("  - Execution provider: CPU (pure Rust)");
        #[allow(clippy::cast_precision_loss)] // Precision loss acceptable for logging display
        let size_mb = model_data.len() as f64 / (1024.0 * 1024.0);
        log::info!("  - Model size: {size_mb:.2} MB");

        if !config.devices.is_empty() {
            log::debug!(
                "Tract runs on CPU only; ignoring {} accelerator device(s)",
                config.devices.len()
            );
        }

        let shape = config.input_shape();
        self.model = Some(Self::build_model(&model_data, shape)?);
        self.input_shape = shape;
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "Tract backend initialized in {:.2}ms",
            model_load_time.as_secs_f64() * 1000.0
        );

        Ok(model_load_time)
    }
}

impl Default for TractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for TractBackend {
    fn initialize(
        &mut self,
        artifact: &ModelArtifact,
        config: &PredictConfig,
    ) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(artifact, config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array2<f32>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ClassifyError::inference("Tract model not initialized"))?;

        log::debug!("Running Tract inference on input {:?}", input.shape());
        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());
        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| ClassifyError::inference(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::inference("No output tensor found"))?
            .into_arc_tensor();

        let output_view = output_tensor.to_array_view::<f32>().map_err(|e| {
            ClassifyError::inference(format!("Failed to convert output tensor: {e}"))
        })?;
        let shape = output_view.shape().to_vec();
        let data = output_view.iter().copied().collect();
        let probabilities = to_class_matrix(&shape, data)?;

        log::debug!(
            "Tract inference completed in {:.2}ms, output {:?}",
            inference_start.elapsed().as_secs_f64() * 1000.0,
            probabilities.dim()
        );

        Ok(probabilities)
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        self.input_shape
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
