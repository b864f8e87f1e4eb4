//! Standard-score normalization of numeric columns.

use crate::config::ZeroVariancePolicy;
use crate::error::{PrepError, Result};
use crate::profiler::ColumnStats;
use crate::utils::{column_options, column_values, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Statistics used for each scaled column, plus the columns left alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizationReport {
    pub scaled: Vec<ColumnStats>,
    pub skipped: Vec<String>,
}

/// Rescales columns to zero mean and unit (population) standard deviation.
pub struct Normalizer;

impl Normalizer {
    /// Replace each selected column with `(x - mean) / std`.
    ///
    /// `std` uses ddof = 0. Missing values stay missing. Absent or
    /// non-numeric columns are skipped. A zero-variance column either fails
    /// the call or is left unchanged, depending on `policy`.
    pub fn normalize(
        df: &DataFrame,
        columns: &[String],
        policy: ZeroVariancePolicy,
    ) -> Result<(DataFrame, NormalizationReport)> {
        let mut result = df.clone();
        let mut report = NormalizationReport::default();

        for name in columns {
            let Ok(col) = df.column(name) else {
                debug!("Skipping normalization for missing column '{}'", name);
                continue;
            };
            if !is_numeric_dtype(col.dtype()) {
                debug!("Skipping normalization for non-numeric column '{}'", name);
                continue;
            }

            let values = column_values(df, name)?;
            if values.is_empty() {
                debug!("Column '{}' has no values to normalize", name);
                report.skipped.push(name.clone());
                continue;
            }
            let stats = match ColumnStats::compute(name.as_str(), &values, 0) {
                Some(stats) if stats.std > 0.0 && stats.std.is_finite() => stats,
                _ => match policy {
                    ZeroVariancePolicy::Fail => {
                        return Err(PrepError::DegenerateColumn {
                            column: name.clone(),
                        });
                    }
                    ZeroVariancePolicy::Skip => {
                        warn!("Column '{}' has zero variance, left unscaled", name);
                        report.skipped.push(name.clone());
                        continue;
                    }
                },
            };

            let scaled: Vec<Option<f64>> = column_options(df, name)?
                .into_iter()
                .map(|v| v.map(|x| (x - stats.mean) / stats.std))
                .collect();
            result.replace(name, Series::new(name.as_str().into(), scaled))?;

            debug!(
                "Normalized '{}' (mean={:.4}, std={:.4})",
                name, stats.mean, stats.std
            );
            report.scaled.push(stats);
        }

        info!(
            "Normalized {} columns ({} skipped)",
            report.scaled.len(),
            report.skipped.len()
        );

        Ok((result, report))
    }
}
