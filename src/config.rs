//! Request and configuration types for the collector and the predictor

use crate::device::AcceleratorDevice;
use crate::error::{ClassifyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Side length of the square model input and of generated placeholders
pub const TARGET_SIZE: u32 = 224;

/// Upper bound on images generated per label
pub const MAX_IMAGES_PER_LABEL: usize = 10;

/// Execution provider options for the inference backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionProvider {
    /// Auto-detect best available provider (CUDA > `CoreML` > CPU)
    #[default]
    Auto,
    /// CPU execution (always available)
    Cpu,
    /// NVIDIA CUDA GPU acceleration
    Cuda,
    /// Apple Silicon acceleration
    CoreMl,
}

impl std::fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
            Self::CoreMl => write!(f, "coreml"),
        }
    }
}

/// Inference engine used to run the model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendType {
    /// Pure Rust inference with Tract
    Tract,
    /// ONNX Runtime inference
    Onnx,
}

impl Default for BackendType {
    fn default() -> Self {
        if cfg!(feature = "tract") {
            Self::Tract
        } else {
            Self::Onnx
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tract => write!(f, "tract"),
            Self::Onnx => write!(f, "onnx"),
        }
    }
}

/// Memory layout of the input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// Batch, height, width, channels (Keras default)
    #[default]
    Nhwc,
    /// Batch, channels, height, width
    Nchw,
}

impl TensorLayout {
    /// Shape of a single-sample batch for a square image of `size`
    #[must_use]
    pub fn batch_shape(self, size: u32) -> (usize, usize, usize, usize) {
        let size = size as usize;
        match self {
            Self::Nhwc => (1, size, size, 3),
            Self::Nchw => (1, 3, size, size),
        }
    }
}

impl std::str::FromStr for TensorLayout {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nhwc" => Ok(Self::Nhwc),
            "nchw" => Ok(Self::Nchw),
            other => Err(ClassifyError::invalid_config(format!(
                "Unknown tensor layout: {other}. Supported: nhwc, nchw"
            ))),
        }
    }
}

/// Invocation request of the placeholder generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectRequest {
    pub labels: Vec<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_max_images")]
    pub max_images: i64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_max_images() -> i64 {
    50
}

impl CollectRequest {
    /// Parse the single JSON command-line argument
    pub fn from_json_arg(arg: &str) -> Result<Self> {
        serde_json::from_str(arg).map_err(|e| {
            ClassifyError::invalid_request(format!("Malformed collect request: {e}"))
        })
    }

    /// Number of images generated per label after clamping
    #[must_use]
    pub fn images_per_label(&self) -> usize {
        usize::try_from(self.max_images.max(0))
            .unwrap_or(usize::MAX)
            .min(MAX_IMAGES_PER_LABEL)
    }
}

/// Invocation request of the inference runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub model_dir: PathBuf,
    pub image_path: PathBuf,
}

impl PredictRequest {
    /// Parse the single JSON command-line argument
    pub fn from_json_arg(arg: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(arg).map_err(|e| {
            ClassifyError::invalid_request(format!("Malformed predict request: {e}"))
        })?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_dir.as_os_str().is_empty() {
            return Err(ClassifyError::invalid_request("model_dir must not be empty"));
        }
        if self.image_path.as_os_str().is_empty() {
            return Err(ClassifyError::invalid_request("image_path must not be empty"));
        }
        Ok(())
    }
}

/// Configuration of the inference pipeline
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub backend_type: BackendType,
    pub execution_provider: ExecutionProvider,
    pub layout: TensorLayout,
    pub target_size: u32,
    /// Accelerators the backend may use, after memory-growth setup
    pub devices: Vec<AcceleratorDevice>,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendType::default(),
            execution_provider: ExecutionProvider::default(),
            layout: TensorLayout::default(),
            target_size: TARGET_SIZE,
            devices: Vec::new(),
        }
    }
}

impl PredictConfig {
    #[must_use]
    pub fn builder() -> PredictConfigBuilder {
        PredictConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_size == 0 {
            return Err(ClassifyError::invalid_config(
                "Target size must be greater than zero",
            ));
        }
        if self.backend_type == BackendType::Tract
            && !matches!(
                self.execution_provider,
                ExecutionProvider::Cpu | ExecutionProvider::Auto
            )
        {
            return Err(ClassifyError::invalid_config(format!(
                "Tract backend only supports the cpu provider, got {}",
                self.execution_provider
            )));
        }
        Ok(())
    }

    /// Expected input tensor shape
    #[must_use]
    pub fn input_shape(&self) -> (usize, usize, usize, usize) {
        self.layout.batch_shape(self.target_size)
    }
}

/// Builder for `PredictConfig`
#[derive(Debug, Default)]
pub struct PredictConfigBuilder {
    config: PredictConfig,
}

impl PredictConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend_type(mut self, backend_type: BackendType) -> Self {
        self.config.backend_type = backend_type;
        self
    }

    #[must_use]
    pub fn execution_provider(mut self, provider: ExecutionProvider) -> Self {
        self.config.execution_provider = provider;
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: TensorLayout) -> Self {
        self.config.layout = layout;
        self
    }

    #[must_use]
    pub fn target_size(mut self, size: u32) -> Self {
        self.config.target_size = size;
        self
    }

    #[must_use]
    pub fn devices(mut self, devices: Vec<AcceleratorDevice>) -> Self {
        self.config.devices = devices;
        self
    }

    pub fn build(self) -> Result<PredictConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_request_full() {
        let request = CollectRequest::from_json_arg(
            r#"{"labels": ["cat", "dog"], "output_dir": "/tmp/ds", "max_images": 3}"#,
        )
        .unwrap();
        assert_eq!(request.labels, vec!["cat", "dog"]);
        assert_eq!(request.output_dir, PathBuf::from("/tmp/ds"));
        assert_eq!(request.images_per_label(), 3);
    }

    #[test]
    fn test_collect_request_defaults() {
        let request = CollectRequest::from_json_arg(r#"{"labels": ["cat"]}"#).unwrap();
        assert_eq!(request.output_dir, PathBuf::from("./images"));
        assert_eq!(request.max_images, 50);
        assert_eq!(request.images_per_label(), MAX_IMAGES_PER_LABEL);
    }

    #[test]
    fn test_collect_request_clamping() {
        let mut request = CollectRequest::from_json_arg(r#"{"labels": []}"#).unwrap();
        request.max_images = -4;
        assert_eq!(request.images_per_label(), 0);
        request.max_images = i64::MAX;
        assert_eq!(request.images_per_label(), 10);
    }

    #[test]
    fn test_collect_request_malformed() {
        for arg in ["not json", "{", r#"{"output_dir": "x"}"#, r#"{"labels": "cat"}"#] {
            let err = CollectRequest::from_json_arg(arg).unwrap_err();
            assert!(matches!(err, ClassifyError::InvalidRequest(_)), "{arg}");
        }
    }

    #[test]
    fn test_predict_request() {
        let request = PredictRequest::from_json_arg(
            r#"{"model_dir": "/models/flowers", "image_path": "/tmp/rose.png"}"#,
        )
        .unwrap();
        assert_eq!(request.model_dir, PathBuf::from("/models/flowers"));
        assert_eq!(request.image_path, PathBuf::from("/tmp/rose.png"));

        assert!(PredictRequest::from_json_arg(r#"{"model_dir": "/m"}"#).is_err());
        assert!(PredictRequest::from_json_arg(r#"{"model_dir": "", "image_path": "a"}"#).is_err());
    }

    #[test]
    fn test_layout_shapes() {
        assert_eq!(TensorLayout::Nhwc.batch_shape(224), (1, 224, 224, 3));
        assert_eq!(TensorLayout::Nchw.batch_shape(224), (1, 3, 224, 224));
        assert_eq!("NCHW".parse::<TensorLayout>().unwrap(), TensorLayout::Nchw);
        assert!("hwc".parse::<TensorLayout>().is_err());
    }

    #[test]
    fn test_config_builder_validation() {
        let config = PredictConfig::builder().build().unwrap();
        assert_eq!(config.target_size, TARGET_SIZE);
        assert_eq!(config.input_shape(), (1, 224, 224, 3));

        assert!(PredictConfig::builder().target_size(0).build().is_err());
        assert!(PredictConfig::builder()
            .backend_type(BackendType::Tract)
            .execution_provider(ExecutionProvider::Cuda)
            .build()
            .is_err());
    }
}
