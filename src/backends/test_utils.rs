//! Mock backend for testing the prediction pipeline
//!
//! Returns a fixed probability vector so the pre- and post-processing
//! contract can be tested without a model file or an inference engine.

use crate::{
    config::PredictConfig,
    error::{ClassifyError, Result},
    inference::InferenceBackend,
    models::ModelArtifact,
};
use instant::Duration;
use ndarray::{Array2, Array4};
use std::sync::{Arc, Mutex};

/// Mock backend with a canned output
#[derive(Debug, Clone)]
pub struct MockBackend {
    initialized: bool,
    probabilities: Vec<f32>,
    input_shape: (usize, usize, usize, usize),
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Shape of the last tensor passed to `infer`
    last_input_shape: Arc<Mutex<Option<Vec<usize>>>>,
    should_fail_init: bool,
    should_fail_inference: bool,
}

impl MockBackend {
    #[must_use]
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            initialized: false,
            probabilities,
            input_shape: (1, 224, 224, 3),
            call_history: Arc::new(Mutex::new(Vec::new())),
            last_input_shape: Arc::new(Mutex::new(None)),
            should_fail_init: false,
            should_fail_inference: false,
        }
    }

    /// Create a mock backend that will fail during initialization
    #[must_use]
    pub fn new_failing_init() -> Self {
        let mut backend = Self::new(Vec::new());
        backend.should_fail_init = true;
        backend
    }

    /// Create a mock backend that will fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::new(Vec::new());
        backend.should_fail_inference = true;
        backend
    }

    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn last_input_shape(&self) -> Option<Vec<usize>> {
        self.last_input_shape.lock().unwrap().clone()
    }

    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(
        &mut self,
        _artifact: &ModelArtifact,
        config: &PredictConfig,
    ) -> Result<Option<Duration>> {
        self.record_call("initialize");

        if self.should_fail_init {
            return Err(ClassifyError::model("Mock backend initialization failed"));
        }

        self.input_shape = config.input_shape();
        self.initialized = true;
        Ok(Some(Duration::from_millis(10)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array2<f32>> {
        self.record_call("infer");

        if !self.initialized {
            return Err(ClassifyError::inference("Mock backend not initialized"));
        }
        if self.should_fail_inference {
            return Err(ClassifyError::inference("Mock backend inference failed"));
        }

        if let Ok(mut shape) = self.last_input_shape.lock() {
            *shape = Some(input.shape().to_vec());
        }

        Array2::from_shape_vec((1, self.probabilities.len()), self.probabilities.clone())
            .map_err(|e| ClassifyError::inference(format!("Mock output: {e}")))
    }

    fn input_shape(&self) -> (usize, usize, usize, usize) {
        self.input_shape
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
