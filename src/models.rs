//! Model artifact resolution and class name tables
//!
//! A model directory produced by the training process holds the trained
//! classifier and `class_names.json`. The classifier is looked up by stem,
//! `best_model` before `final_model`; for each stem an ONNX export is
//! preferred over the Keras HDF5 file.

use crate::error::{ClassifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Model file stems in resolution order
pub const MODEL_STEMS: [&str; 2] = ["best_model", "final_model"];

/// Model file extensions tried for each stem, in order
pub const MODEL_EXTENSIONS: [&str; 2] = ["onnx", "h5"];

/// File name of the index-to-name table inside the model directory
pub const CLASS_NAMES_FILE: &str = "class_names.json";

const HDF5_MAGIC: &[u8] = b"\x89HDF\r\n\x1a\n";

/// Serialization format of a model file, detected from its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFormat {
    /// ONNX protobuf graph
    Onnx,
    /// Keras HDF5 container
    KerasHdf5,
}

impl ModelFormat {
    /// Detect the format from the leading bytes of a model file
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(HDF5_MAGIC) {
            Self::KerasHdf5
        } else {
            Self::Onnx
        }
    }
}

/// A resolved classifier file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    pub path: PathBuf,
}

impl ModelArtifact {
    /// Find the classifier inside `model_dir`
    pub fn resolve<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let found = MODEL_STEMS
            .iter()
            .flat_map(|stem| {
                MODEL_EXTENSIONS
                    .iter()
                    .map(move |ext| model_dir.join(format!("{stem}.{ext}")))
            })
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Resolved model artifact");
                Ok(Self { path })
            },
            None => Err(ClassifyError::model_not_found(model_dir)),
        }
    }

    /// Read the model bytes, rejecting formats the backends cannot execute
    pub fn load(&self) -> Result<Vec<u8>> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| ClassifyError::file_io_error("read model", &self.path, e))?;

        if bytes.is_empty() {
            return Err(ClassifyError::model_error_with_context(
                "load",
                &self.path,
                "file is empty",
                &[],
            ));
        }

        match ModelFormat::detect(&bytes) {
            ModelFormat::Onnx => Ok(bytes),
            ModelFormat::KerasHdf5 => Err(ClassifyError::model_error_with_context(
                "load",
                &self.path,
                "Keras HDF5 models cannot be executed directly",
                &[
                    "export the model to ONNX (e.g. with tf2onnx)",
                    "save the export next to it as best_model.onnx or final_model.onnx",
                ],
            )),
        }
    }

    /// Display name used in logs
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// Mapping from class index to display name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNameTable {
    names: HashMap<String, String>,
}

impl ClassNameTable {
    /// Load `class_names.json` from a model directory
    pub fn load_from_dir<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let path = model_dir.as_ref().join(CLASS_NAMES_FILE);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ClassifyError::file_io_error("read class table", &path, e))?;
        Self::from_json(&content)
    }

    /// Parse a JSON object with stringified indices as keys
    pub fn from_json(content: &str) -> Result<Self> {
        let names: HashMap<String, String> = serde_json::from_str(content)
            .map_err(|e| ClassifyError::class_table(format!("Malformed {CLASS_NAMES_FILE}: {e}")))?;
        Ok(Self { names })
    }

    /// Look up the display name of a class index
    pub fn name(&self, index: usize) -> Result<&str> {
        self.names
            .get(&index.to_string())
            .map(String::as_str)
            .ok_or(ClassifyError::ClassLookup { index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNameTable {
    /// Build a table whose indices follow iteration order
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .enumerate()
            .map(|(i, name)| (i.to_string(), name.into()))
            .collect();
        Self { names }
    }
}
