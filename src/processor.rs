//! Single-image classification pipeline
//!
//! Resolves the model artifact, loads the class table, preprocesses the image,
//! runs one forward pass and turns the output into a `PredictionResult`.
//! Progress lines go to the writer handed in by the caller.

use crate::{
    backends,
    config::{PredictConfig, PredictRequest},
    error::{ClassifyError, Result},
    inference::InferenceBackend,
    models::{ClassNameTable, ModelArtifact},
    types::PredictionResult,
    utils::{ImagePreprocessor, PreprocessingOptions},
};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info_span};

/// Creates inference backends for the processor
pub trait BackendFactory {
    /// Create a backend for the given configuration
    fn create_backend(&self, config: &PredictConfig) -> Result<Box<dyn InferenceBackend>>;
}

/// Factory for the backends compiled into the crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackendFactory;

impl BackendFactory for DefaultBackendFactory {
    fn create_backend(&self, config: &PredictConfig) -> Result<Box<dyn InferenceBackend>> {
        backends::create_backend(config)
    }
}

/// Classification processor owning one backend
pub struct ClassificationProcessor {
    config: PredictConfig,
    backend: Box<dyn InferenceBackend>,
}

impl ClassificationProcessor {
    /// Create a processor with the default backend factory
    pub fn new(config: PredictConfig) -> Result<Self> {
        Self::with_factory(config, &DefaultBackendFactory)
    }

    /// Create a processor with a custom backend factory
    pub fn with_factory(config: PredictConfig, factory: &dyn BackendFactory) -> Result<Self> {
        config.validate()?;
        let backend = factory.create_backend(&config)?;
        Ok(Self { config, backend })
    }

    #[must_use]
    pub fn config(&self) -> &PredictConfig {
        &self.config
    }

    /// Classify the image named by the request
    pub fn predict<W: Write>(
        &mut self,
        request: &PredictRequest,
        progress: &mut W,
    ) -> Result<PredictionResult> {
        let span = info_span!(
            "predict",
            model_dir = %request.model_dir.display(),
            image = %request.image_path.display()
        );
        let _guard = span.enter();

        writeln!(progress, "Loading model...")?;
        let artifact = ModelArtifact::resolve(&request.model_dir)?;
        self.ensure_initialized(&artifact)?;
        let class_names = ClassNameTable::load_from_dir(&request.model_dir)?;
        debug!(classes = class_names.len(), "Loaded class table");

        writeln!(progress, "Processing image...")?;
        let probabilities = {
            let image = ImagePreprocessor::load_image(&request.image_path)?;
            let input = ImagePreprocessor::preprocess(&image, &self.preprocessing_options())?;

            writeln!(progress, "Running inference...")?;
            self.backend.infer(&input)?
        };

        let first_row = probabilities
            .rows()
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::inference("Model returned an empty batch"))?
            .to_vec();

        PredictionResult::from_probabilities(&first_row, &class_names)
    }

    /// Convenience wrapper for callers holding plain paths
    pub fn predict_paths<W: Write>(
        &mut self,
        model_dir: &Path,
        image_path: &Path,
        progress: &mut W,
    ) -> Result<PredictionResult> {
        let request = PredictRequest {
            model_dir: model_dir.to_path_buf(),
            image_path: image_path.to_path_buf(),
        };
        request.validate()?;
        self.predict(&request, progress)
    }

    fn ensure_initialized(&mut self, artifact: &ModelArtifact) -> Result<()> {
        if let Some(load_time) = self.backend.initialize(artifact, &self.config)? {
            debug!(
                model = %artifact.name(),
                load_ms = load_time.as_millis() as u64,
                "Backend initialized"
            );
        }
        Ok(())
    }

    fn preprocessing_options(&self) -> PreprocessingOptions {
        PreprocessingOptions {
            target_size: self.config.target_size,
            layout: self.config.layout,
            ..PreprocessingOptions::default()
        }
    }
}
