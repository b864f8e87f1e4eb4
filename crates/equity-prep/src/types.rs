//! Result types shared by the pipeline driver, the reports and the CLI.

use crate::imputers::MissingValueReport;
use crate::pipeline::normalizer::NormalizationReport;
use crate::pipeline::outliers::OutlierReport;
use crate::profiler::ColumnDescription;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a cleaning run produced.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// The cleaned, normalized table (what gets persisted).
    pub data: DataFrame,
    /// The working table after a second outlier pass, for before/after
    /// comparison. Not normalized and not persisted.
    pub comparison: DataFrame,
    pub summary: CleaningSummary,
}

/// Serializable account of a cleaning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Source file, when the run loaded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,
    /// Where the cleaned table was written, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    pub missing_values: MissingValueReport,
    /// Outlier pass that produced the working table.
    pub outliers: OutlierReport,
    /// Second outlier pass over the working table (comparison view).
    pub comparison_outliers: OutlierReport,

    /// Descriptive statistics after date derivation, before scaling.
    pub describe_before: Vec<ColumnDescription>,
    /// Descriptive statistics of the final table.
    pub describe_after: Vec<ColumnDescription>,
    pub normalization: NormalizationReport,

    /// Non-fatal notes collected during the run.
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    /// Rows removed in total, as a percentage of the input rows.
    pub fn rows_removed_percentage(&self) -> f64 {
        if self.rows_before == 0 {
            return 0.0;
        }
        (self.rows_before - self.rows_after) as f64 / self.rows_before as f64 * 100.0
    }
}
