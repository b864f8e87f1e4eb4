//! Statistical imputation methods.
//!
//! Provides mean imputation for numeric columns.

use crate::error::Result;
use crate::utils::{column_values, fill_numeric_nulls};
use polars::prelude::*;
use tracing::debug;

use crate::profiler::mean;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Apply mean imputation to a numeric column.
    ///
    /// Returns the fill value, or `None` when the column is absent, has no
    /// missing entries, or has no non-missing values to average.
    pub fn apply_numeric_mean(df: &mut DataFrame, col_name: &str) -> Result<Option<f64>> {
        let Ok(col) = df.column(col_name) else {
            return Ok(None);
        };
        if col.null_count() == 0 {
            return Ok(None);
        }

        let Some(mean_val) = mean(&column_values(df, col_name)?) else {
            debug!("Column '{}' has no values to average, left as-is", col_name);
            return Ok(None);
        };

        Self::fill_with_value(df, col_name, mean_val)?;
        Ok(Some(mean_val))
    }

    /// Fill numeric column with a specific value.
    fn fill_with_value(df: &mut DataFrame, col_name: &str, fill_value: f64) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let filled = fill_numeric_nulls(&series, fill_value)?;
        df.replace(col_name, filled)?;

        debug!("Filled '{}' with mean: {:.4}", col_name, fill_value);
        Ok(())
    }
}
