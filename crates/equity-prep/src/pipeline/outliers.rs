//! Outlier handling module.
//!
//! Removes rows whose values lie too many standard deviations from the
//! column mean (z-score filtering).

use crate::error::Result;
use crate::profiler::ColumnStats;
use crate::utils::{column_options, column_values, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Acceptance band computed for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub column: String,
    pub mean: f64,
    pub std: f64,
    pub lower: f64,
    pub upper: f64,
    /// Rows whose value in this column fell outside the band.
    pub flagged: usize,
}

/// Outcome of one outlier-removal pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub threshold: f64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub bounds: Vec<OutlierBounds>,
}

/// Z-score outlier filter.
pub struct OutlierFilter;

impl OutlierFilter {
    /// Remove every row where a selected column is an outlier.
    ///
    /// Means and sample standard deviations (ddof = 1) are computed once
    /// from `df` before any row is dropped. A row is kept when
    /// `|x - mean| <= threshold * std` holds for every selected column;
    /// missing values never cause removal. Selected columns that are absent
    /// or non-numeric are skipped, as are columns with fewer than two values.
    pub fn remove_outliers(
        df: &DataFrame,
        columns: &[String],
        threshold: f64,
    ) -> Result<(DataFrame, OutlierReport)> {
        let rows_before = df.height();
        let mut keep = vec![true; rows_before];
        let mut bounds = Vec::new();

        for name in columns {
            let Ok(col) = df.column(name) else {
                debug!("Skipping outlier check for missing column '{}'", name);
                continue;
            };
            if !is_numeric_dtype(col.dtype()) {
                debug!("Skipping outlier check for non-numeric column '{}'", name);
                continue;
            }

            let Some(stats) = ColumnStats::compute(name.as_str(), &column_values(df, name)?, 1)
            else {
                debug!("Not enough values in '{}' to compute a z-score", name);
                continue;
            };

            let limit = threshold * stats.std;
            let mut flagged = 0;
            for (i, value) in column_options(df, name)?.into_iter().enumerate() {
                // NaN compares false and is treated like a missing value
                if let Some(x) = value
                    && (x - stats.mean).abs() > limit
                {
                    flagged += 1;
                    keep[i] = false;
                }
            }

            debug!(
                "Column '{}': mean={:.4}, std={:.4}, {} values outside {} std",
                name, stats.mean, stats.std, flagged, threshold
            );

            bounds.push(OutlierBounds {
                column: stats.column,
                mean: stats.mean,
                std: stats.std,
                lower: stats.mean - limit,
                upper: stats.mean + limit,
                flagged,
            });
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let filtered = df.filter(&mask)?;
        let rows_after = filtered.height();

        info!(
            "Outlier removal: {} rows removed ({} -> {})",
            rows_before - rows_after,
            rows_before,
            rows_after
        );

        Ok((
            filtered,
            OutlierReport {
                threshold,
                rows_before,
                rows_after,
                rows_removed: rows_before - rows_after,
                bounds,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_removes_single_extreme_row() {
        let mut close = vec![10.0; 20];
        close.push(1000.0);
        let df = df!["Close" => close].unwrap();

        let (filtered, report) =
            OutlierFilter::remove_outliers(&df, &names(&["Close"]), 3.0).unwrap();

        assert_eq!(filtered.height(), 20);
        assert_eq!(report.rows_removed, 1);
        assert_eq!(report.bounds[0].flagged, 1);
        assert!(column_values(&filtered, "Close").unwrap().iter().all(|v| *v == 10.0));
    }

    #[test]
    fn test_two_far_apart_values_are_kept() {
        // Each point sits about 0.707 sample std from the mean
        let df = df!["Volume" => [100.0, 1e8]].unwrap();

        let (filtered, report) =
            OutlierFilter::remove_outliers(&df, &names(&["Volume"]), 3.0).unwrap();

        assert_eq!(filtered.height(), 2);
        assert_eq!(report.rows_removed, 0);
    }

    #[test]
    fn test_missing_values_never_remove_rows() {
        let mut close: Vec<Option<f64>> = vec![Some(10.0); 20];
        close.push(None);
        let df = df!["Close" => close].unwrap();

        let (filtered, _) = OutlierFilter::remove_outliers(&df, &names(&["Close"]), 3.0).unwrap();
        assert_eq!(filtered.height(), 21);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        // mean 0, sample std exactly 1
        let df = df!["x" => [-1.0, 0.0, 1.0]].unwrap();

        let (filtered, report) = OutlierFilter::remove_outliers(&df, &names(&["x"]), 1.0).unwrap();
        assert_eq!(filtered.height(), 3);
        assert_eq!(report.bounds[0].lower, -1.0);
        assert_eq!(report.bounds[0].upper, 1.0);
    }

    #[test]
    fn test_statistics_are_computed_once() {
        // After the 1000 row goes, 20 becomes extreme among the 10s, but the
        // pass uses the statistics of its own input only.
        let mut x = vec![10.0; 20];
        x.push(20.0);
        x.push(1000.0);
        let df = df!["x" => x].unwrap();

        let (filtered, report) = OutlierFilter::remove_outliers(&df, &names(&["x"]), 3.0).unwrap();
        assert_eq!(filtered.height(), 21);
        assert_eq!(report.rows_removed, 1);
    }

    #[test]
    fn test_skips_text_absent_and_short_columns() {
        let df = df![
            "Date" => ["a", "b"],
            "Close" => [Some(1.0), None],
        ]
        .unwrap();

        let (filtered, report) =
            OutlierFilter::remove_outliers(&df, &names(&["Date", "Nope", "Close"]), 3.0)
                .unwrap();
        assert_eq!(filtered.height(), 2);
        assert!(report.bounds.is_empty());
    }

    #[test]
    fn test_unselected_columns_are_ignored() {
        let mut year = vec![2020i32; 20];
        year.push(1900);
        let df = df![
            "Close" => vec![1.0; 21],
            "Year" => year,
        ]
        .unwrap();

        let (filtered, _) = OutlierFilter::remove_outliers(&df, &names(&["Close"]), 3.0).unwrap();
        assert_eq!(filtered.height(), 21);
    }
}
