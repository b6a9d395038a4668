//! Prediction result types and their text renderings
//!
//! The calling application parses the pretty-printed JSON block and the
//! final `RESULT:` line, so both formats are part of the external contract.

use crate::error::{ClassifyError, Result};
use crate::models::ClassNameTable;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Confidence of one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfidence {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
}

/// Outcome of classifying one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class: String,
    pub confidence: f32,
    /// Per-class confidences in model output order
    pub all_predictions: Vec<ClassConfidence>,
}

/// Index of the largest value, the first one on ties
///
/// NaN entries never win.
#[must_use]
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, best_v)) if v <= best_v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

impl PredictionResult {
    /// Build a result from a probability vector and the class table
    pub fn from_probabilities(probabilities: &[f32], class_names: &ClassNameTable) -> Result<Self> {
        let top = argmax(probabilities).ok_or_else(|| {
            ClassifyError::inference("Model output contains no usable probabilities")
        })?;

        let all_predictions = probabilities
            .iter()
            .enumerate()
            .map(|(index, &confidence)| {
                Ok(ClassConfidence {
                    class_name: class_names.name(index)?.to_string(),
                    confidence,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let predicted = all_predictions
            .get(top)
            .ok_or_else(|| ClassifyError::internal("Arg-max index out of range"))?;

        Ok(Self {
            predicted_class: predicted.class_name.clone(),
            confidence: predicted.confidence,
            all_predictions,
        })
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ClassifyError::internal(format!("Failed to serialize result: {e}")))
    }

    /// Single-line summary parsed by the caller
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "RESULT: {} ({:.1}%)",
            self.predicted_class,
            self.confidence * 100.0
        )
    }

    /// Write the human-readable listing followed by the JSON document
    pub fn write_report<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out)?;
        writeln!(out, "Prediction: {}", self.predicted_class)?;
        writeln!(out, "Confidence: {:.2}%", self.confidence * 100.0)?;
        writeln!(out)?;
        writeln!(out, "All class scores:")?;
        for entry in &self.all_predictions {
            writeln!(out, "  {}: {:.2}%", entry.class_name, entry.confidence * 100.0)?;
        }
        writeln!(out)?;
        writeln!(out, "{}", self.to_pretty_json()?)?;
        Ok(())
    }
}
