//! ONNX Runtime backend implementation for classification models
//!
//! Supports CPU, CUDA and `CoreML` execution providers. CUDA devices marked for
//! memory growth get an arena that extends by the requested amount instead of
//! doubling.

use crate::config::{ExecutionProvider, PredictConfig};
use crate::device::{AcceleratorDevice, DeviceKind};
use crate::error::{ClassifyError, Result};
use crate::inference::{to_class_matrix, InferenceBackend};
use crate::models::ModelArtifact;
use log;
use ndarray::{Array2, Array4};
use ort::execution_providers::{
    ArenaExtendStrategy, CUDAExecutionProvider, CoreMLExecutionProvider,
    ExecutionProvider as OrtExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;

/// ONNX Runtime backend for running classifiers
#[derive(Debug)]
pub struct OnnxBackend {
    session: Option<Session>,
    input_shape: (usize, usize, usize, usize),
    initialized: bool,
}

impl OnnxBackend {
    /// Availability of the CUDA and `CoreML` execution providers
    #[must_use]
    pub fn accelerators() -> (bool, bool) {
        let cuda_available =
            OrtExecutionProvider::is_available(&CUDAExecutionProvider::default()).unwrap_or(false);
        let coreml_available =
            OrtExecutionProvider::is_available(&CoreMLExecutionProvider::default())
                .unwrap_or(false);
        log::debug!("ONNX Runtime providers: CUDA={cuda_available}, CoreML={coreml_available}");
        (cuda_available, coreml_available)
    }

    #[must_use]
    pub fn new() -> Self {
        Self {
            session: None,
            input_shape: (1, 224, 224, 3),
            initialized: false,
        }
    }

    fn cuda_provider(device: &AcceleratorDevice) -> ExecutionProviderDispatch {
        let provider = CUDAExecutionProvider::default().with_device_id(device.id);
        if device.memory_growth {
            log::debug!("CUDA device {} uses incremental arena growth", device.id);
            provider
                .with_arena_extend_strategy(ArenaExtendStrategy::SameAsRequested)
                .build()
        } else {
            provider.build()
        }
    }

    /// Execution providers in priority order for the configured provider
    fn providers_for(config: &PredictConfig) -> Vec<ExecutionProviderDispatch> {
        let cuda_devices = config
            .devices
            .iter()
            .filter(|d| d.kind == DeviceKind::Cuda);
        let has_coreml = config.devices.iter().any(|d| d.kind == DeviceKind::CoreMl);

        match config.execution_provider {
            ExecutionProvider::Cpu => Vec::new(),
            ExecutionProvider::Cuda => cuda_devices.take(1).map(Self::cuda_provider).collect(),
            ExecutionProvider::CoreMl => {
                if has_coreml {
                    vec![CoreMLExecutionProvider::default().with_subgraphs(true).build()]
                } else {
                    Vec::new()
                }
            },
            ExecutionProvider::Auto => {
                let mut providers: Vec<_> = cuda_devices.take(1).map(Self::cuda_provider).collect();
                if has_coreml {
                    providers.push(CoreMLExecutionProvider::default().with_subgraphs(true).build());
                }
                providers
            },
        }
    }

    fn load_model(
        &mut self,
        artifact: &ModelArtifact,
        config: &PredictConfig,
    ) -> Result<std::time::Duration> {
        let model_load_start = std::time::Instant::now();
        let model_data = artifact.load()?;

        let mut session_builder = Session::builder()
            .map_err(|e| {
                ClassifyError::inference(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                ClassifyError::inference(format!("Failed to set optimization level: {e}"))
            })?;

        let providers = Self::providers_for(config);
        if providers.is_empty() {
            if config.execution_provider == ExecutionProvider::Cpu {
                log::info!("Using CPU execution provider");
            } else {
                log::warn!(
                    "{} execution provider requested but no matching device found, \
                     falling back to CPU",
                    config.execution_provider
                );
            }
        } else {
            log::info!(
                "Hardware acceleration enabled with {count} provider(s)",
                count = providers.len()
            );
            session_builder = session_builder
                .with_execution_providers(providers)
                .map_err(|e| {
                    ClassifyError::inference(format!("Failed to set execution providers: {e}"))
                })?;
        }

        let session = session_builder
            .commit_from_memory(&model_data)
            .map_err(|e| {
                ClassifyError::model_error_with_context(
                    "create session for",
                    &artifact.path,
                    &e.to_string(),
                    &["check that the file is a valid ONNX export"],
                )
            })?;

        self.session = Some(session);
        self.input_shape = config.input_shape();
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "Model {} loaded in {:.0}ms",
            artifact.name(),
            model_load_time.as_secs_f64() * 1000.0
        );

        Ok(model_load_time)
    }
}

impl Default for OnnxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for OnnxBackend {
    fn initialize(
        &mut self,
        artifact: &ModelArtifact,
        config: &PredictConfig,
    ) -> Result<Option<std::time::Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(artifact, config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array2<f32>> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ClassifyError::inference("ONNX session not initialized"))?;

        let inference_start = std::time::Instant::now();
        log::debug!("Starting inference with input shape: {:?}", input.dim());

        let input_value = Value::from_array(input.clone()).map_err(|e| {
            ClassifyError::processing(format!("Failed to convert input tensor: {e}"))
        })?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| ClassifyError::inference(format!("ONNX inference failed: {e}")))?;

        // Positional access to the first output avoids depending on tensor names
        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| ClassifyError::inference("Model produced no outputs"))?;
        let output = outputs
            .get(first_key)
            .ok_or_else(|| ClassifyError::inference("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| {
                ClassifyError::inference(format!("Failed to extract output tensor: {e}"))
            })?;

        let shape = output.shape().to_vec();
        let data = output.iter().copied().collect();
        let probabilities = to_class_matrix(&shape, data)?;

        log::debug!(
            "ONNX inference completed in {:.2}ms, output {:?}",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onnx_backend_creation() {
        let backend = OnnxBackend::new();
        assert!(!backend.is_initialized());
        assert_eq!(backend.input_shape(), (1, 224, 224, 3));
    }

    #[test]
    fn test_cpu_provider_selects_nothing() {
        let config = PredictConfig {
            execution_provider: ExecutionProvider::Cpu,
            devices: vec![AcceleratorDevice::new(DeviceKind::Cuda, 0)],
            ..PredictConfig::default()
        };
        assert!(OnnxBackend::providers_for(&config).is_empty());
    }

    #[test]
    fn test_auto_provider_uses_discovered_devices() {
        let mut devices = vec![
            AcceleratorDevice::new(DeviceKind::Cuda, 0),
            AcceleratorDevice::new(DeviceKind::CoreMl, 0),
        ];
        crate::device::enable_memory_growth(&mut devices);
        let config = PredictConfig {
            execution_provider: ExecutionProvider::Auto,
            devices,
            ..PredictConfig::default()
        };
        assert_eq!(OnnxBackend::providers_for(&config).len(), 2);
    }

    #[test]
    fn test_infer_before_initialize_fails() {
        let mut backend = OnnxBackend::new();
        let input = Array4::<f32>::zeros((1, 224, 224, 3));
        assert!(backend.infer(&input).is_err());
    }
}
