//! Pipeline module.
//!
//! This module provides the cleaning pipeline driver and its stages.

mod builder;
pub mod dates;
pub mod normalizer;
pub mod outliers;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use dates::{DateFieldDeriver, parse_date, parse_date_column};
pub use normalizer::{NormalizationReport, Normalizer};
pub use outliers::{OutlierBounds, OutlierFilter, OutlierReport};
pub use progress::{CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};
