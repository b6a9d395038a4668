//! Error types for dataset collection and classification

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for labelvision operations
pub type Result<T> = std::result::Result<T, ClassifyError>;

/// Error types for dataset collection and classification
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed invocation argument (bad JSON, missing field, bad value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Neither model candidate exists in the model directory
    #[error(
        "Model file not found in '{}' (looked for best_model.onnx, best_model.h5, \
         final_model.onnx, final_model.h5)",
        model_dir.display()
    )]
    ModelNotFound { model_dir: PathBuf },

    /// Model loading or initialization errors
    #[error("Model error: {0}")]
    Model(String),

    /// Class name table could not be parsed
    #[error("Class name table error: {0}")]
    ClassTable(String),

    /// The model produced an index the class table does not know
    #[error("No class name for index {index} in class_names.json")]
    ClassLookup { index: usize },

    /// Backend inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tensor or buffer preparation errors
    #[error("Processing error: {0}")]
    Processing(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClassifyError {
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn model_not_found<P: AsRef<Path>>(model_dir: P) -> Self {
        Self::ModelNotFound {
            model_dir: model_dir.as_ref().to_path_buf(),
        }
    }

    pub fn model<S: Into<String>>(msg: S) -> Self {
        Self::Model(msg.into())
    }

    pub fn class_table<S: Into<String>>(msg: S) -> Self {
        Self::ClassTable(msg.into())
    }

    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<Path>>(operation: &str, path: P, error: std::io::Error) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create image loading error with format context
    pub fn image_load_error<P: AsRef<Path>>(path: P, error: image::ImageError) -> Self {
        let path_display = path.as_ref().display();
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown");

        Self::Image(image::ImageError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Failed to load image '{}' (format: {}): {}. \
                 Supported formats: PNG, JPEG, WebP, TIFF, BMP, GIF",
                path_display, extension, error
            ),
        )))
    }

    /// Create model error with troubleshooting context
    pub fn model_error_with_context<P: AsRef<Path>>(
        operation: &str,
        model_path: P,
        error: &str,
        suggestions: &[&str],
    ) -> Self {
        let path_display = model_path.as_ref().display();
        let suggestion_text = if suggestions.is_empty() {
            String::new()
        } else {
            format!(" Suggestions: {}", suggestions.join(", "))
        };

        Self::Model(format!(
            "Failed to {} model '{}': {}.{}",
            operation, path_display, error, suggestion_text
        ))
    }

    /// True for errors a caller should treat as "model not found"
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound { .. })
    }
}
