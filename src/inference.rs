//! Inference backend abstraction

use crate::{config::PredictConfig, error::Result, models::ModelArtifact};
use ndarray::{Array2, Array4};

// Use instant crate for cross-platform time compatibility
use instant::Duration;

/// Trait for inference backends
pub trait InferenceBackend {
    /// Load the model artifact and prepare it for inference
    ///
    /// # Errors
    /// - Model file unreadable or in an unsupported format
    /// - Backend initialization failures
    fn initialize(&mut self, artifact: &ModelArtifact, config: &PredictConfig)
        -> Result<Option<Duration>>;

    /// Run one forward pass, returning a `(batch, classes)` probability matrix
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    /// - Output tensor of an unexpected shape
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array2<f32>>;

    /// Get the expected input shape for this backend
    fn input_shape(&self) -> (usize, usize, usize, usize);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;
}

/// Flatten a raw model output into a `(batch, classes)` matrix
///
/// Classifier heads usually emit `[batch, classes]`, but exports sometimes
/// keep trailing unit dimensions (`[batch, classes, 1, 1]`) or drop the batch
/// axis entirely.
pub(crate) fn to_class_matrix(shape: &[usize], data: Vec<f32>) -> Result<Array2<f32>> {
    let (batch, classes) = match shape {
        [] => {
            return Err(crate::error::ClassifyError::inference(
                "Model produced a scalar output",
            ))
        },
        [classes] => (1, *classes),
        [batch, rest @ ..] => (*batch, rest.iter().product()),
    };

    Array2::from_shape_vec((batch, classes), data).map_err(|e| {
        crate::error::ClassifyError::inference(format!(
            "Failed to reshape output tensor {shape:?}: {e}"
        ))
    })
}
