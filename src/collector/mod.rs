//! Dataset placeholder generation

pub mod dataset;
pub mod source;

pub use dataset::{CollectSummary, DatasetCollector, DEFAULT_LABEL_PAUSE};
pub use source::{ImageSource, PlaceholderSource, FONT_ENV_VAR};
