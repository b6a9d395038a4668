//! Per-label dataset directories filled from an `ImageSource`

use super::source::ImageSource;
use crate::config::CollectRequest;
use crate::error::{ClassifyError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info_span, warn};

/// Default pause between two labels
pub const DEFAULT_LABEL_PAUSE: Duration = Duration::from_secs(1);

/// Outcome of a collection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl CollectSummary {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes `<output_dir>/<label>/<label>_<n>.jpg` for every requested label
pub struct DatasetCollector<S: ImageSource> {
    source: S,
    output_dir: PathBuf,
    images_per_label: usize,
    label_pause: Duration,
}

impl<S: ImageSource> DatasetCollector<S> {
    pub fn new(source: S, output_dir: impl Into<PathBuf>, images_per_label: usize) -> Self {
        Self {
            source,
            output_dir: output_dir.into(),
            images_per_label,
            label_pause: DEFAULT_LABEL_PAUSE,
        }
    }

    /// Build a collector from a decoded request
    pub fn from_request(source: S, request: &CollectRequest) -> Self {
        Self::new(source, &request.output_dir, request.images_per_label())
    }

    /// Set the pause between labels
    #[must_use]
    pub fn with_label_pause(mut self, pause: Duration) -> Self {
        self.label_pause = pause;
        self
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn images_per_label(&self) -> usize {
        self.images_per_label
    }

    /// Fill the directory for one label
    ///
    /// Failures are reported on `out` and yield `false`; they never abort
    /// the caller's loop over labels.
    pub fn collect_label<W: Write>(&mut self, label: &str, out: &mut W) -> Result<bool> {
        let span = info_span!("collect_label", label, source = self.source.name());
        let _guard = span.enter();

        writeln!(out, "Generating: {label}")?;
        match self.write_label(label, out) {
            Ok(count) => {
                writeln!(out, "Done: {label} - {count} images")?;
                Ok(true)
            },
            Err(e) => {
                warn!(error = %e, "Label failed");
                writeln!(out, "Error: {e}")?;
                Ok(false)
            },
        }
    }

    /// Process every label in order, pausing between labels
    pub fn run<W: Write>(&mut self, labels: &[String], out: &mut W) -> Result<CollectSummary> {
        let mut summary = CollectSummary::default();

        for (i, label) in labels.iter().enumerate() {
            if i > 0 && !self.label_pause.is_zero() {
                std::thread::sleep(self.label_pause);
            }
            if self.collect_label(label, out)? {
                summary.succeeded.push(label.clone());
            } else {
                summary.failed.push(label.clone());
            }
        }

        writeln!(out, "All image searches completed")?;
        Ok(summary)
    }

    fn write_label<W: Write>(&mut self, label: &str, out: &mut W) -> Result<usize> {
        validate_label(label)?;
        let label_dir = self.output_dir.join(label);
        std::fs::create_dir_all(&label_dir)
            .map_err(|e| ClassifyError::file_io_error("create directory", &label_dir, e))?;

        let images = self.source.fetch(label, self.images_per_label)?;
        for (i, image) in images.iter().enumerate() {
            let file_name = format!("{label}_{}.jpg", i + 1);
            let path = label_dir.join(&file_name);
            image.to_rgb8().save(&path).map_err(|e| {
                ClassifyError::processing(format!("Failed to save '{}': {e}", path.display()))
            })?;
            writeln!(out, "Created: {file_name}")?;
        }

        count_jpegs(&label_dir)
    }
}

/// Reject labels that cannot be a single directory component
fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(ClassifyError::invalid_request("Label must not be empty"));
    }
    if label == "." || label == ".." || label.contains(['/', '\\']) {
        return Err(ClassifyError::invalid_request(format!(
            "Label '{label}' is not a valid directory name"
        )));
    }
    Ok(())
}

fn count_jpegs(dir: &Path) -> Result<usize> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| ClassifyError::file_io_error("read directory", dir, e))?;
    let mut count = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "jpg") {
            count += 1;
        }
    }
    Ok(count)
}
