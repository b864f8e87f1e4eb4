//! Forecast error and accuracy metrics over matched actual/predicted pairs.

use crate::error::{PrepError, Result};
use crate::profiler::{mean, pearson};
use serde::{Deserialize, Serialize};

/// Share of predictions per absolute percentage error band, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBands {
    pub below_5_pct: f64,
    pub from_5_to_10_pct: f64,
    pub above_10_pct: f64,
}

/// Error and accuracy metrics for one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub matched_rows: usize,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    /// `None` when the actual values are constant.
    pub r_squared: Option<f64>,
    /// 100 - MAPE.
    pub accuracy: f64,
    /// Percent of rows where both series move in the same direction.
    pub directional_accuracy: f64,
    pub correlation: Option<f64>,
    pub within_5_pct: f64,
    pub within_10_pct: f64,
    pub error_bands: ErrorBands,
}

impl AccuracyMetrics {
    /// Compute every metric from equally long actual and predicted series.
    ///
    /// Fails with `EmptyResult` when there are no pairs and with
    /// `DegenerateColumn` when an actual value is zero (percentage errors
    /// are undefined).
    pub fn compute(
        actual: &[f64],
        predicted: &[f64],
        actual_column: &str,
    ) -> Result<Self> {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Err(PrepError::EmptyResult(
                "no matching dates between actual and predicted series".to_string(),
            ));
        }
        let actual = &actual[..n];
        let predicted = &predicted[..n];

        if actual.contains(&0.0) {
            return Err(PrepError::DegenerateColumn {
                column: actual_column.to_string(),
            });
        }

        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        let pct_errors: Vec<f64> = errors
            .iter()
            .zip(actual)
            .map(|(e, a)| (e / a).abs() * 100.0)
            .collect();

        let mae = mean(&errors.iter().map(|e| e.abs()).collect::<Vec<_>>()).unwrap_or(0.0);
        let mse = mean(&errors.iter().map(|e| e * e).collect::<Vec<_>>()).unwrap_or(0.0);
        let mape = mean(&pct_errors).unwrap_or(0.0);

        let within_5_pct = share(&pct_errors, |e| e < 5.0);
        let within_10_pct = share(&pct_errors, |e| e < 10.0);

        Ok(Self {
            matched_rows: n,
            mae,
            mse,
            rmse: mse.sqrt(),
            mape,
            r_squared: r_squared(actual, predicted),
            accuracy: 100.0 - mape,
            directional_accuracy: directional_accuracy(actual, predicted),
            correlation: pearson(actual, predicted),
            within_5_pct,
            within_10_pct,
            error_bands: ErrorBands {
                below_5_pct: within_5_pct,
                from_5_to_10_pct: within_10_pct - within_5_pct,
                above_10_pct: 100.0 - within_10_pct,
            },
        })
    }
}

/// Coefficient of determination of `predicted` against `actual`.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let actual_mean = mean(actual)?;
    let ss_tot: f64 = actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - ss_res / ss_tot)
}

/// Percent of rows whose "went up" flags agree.
///
/// A row went up when its difference from the previous row is positive.
/// The first row has no previous value and counts as "not up" in both
/// series, so it always agrees.
pub fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let went_up = |values: &[f64], i: usize| i > 0 && values[i] - values[i - 1] > 0.0;
    let agreeing = (0..n)
        .filter(|&i| went_up(actual, i) == went_up(predicted, i))
        .count();
    agreeing as f64 / n as f64 * 100.0
}

fn share(values: &[f64], predicate: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|v| predicate(**v)).count() as f64 / values.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_forecast() {
        let actual = [10.0, 11.0, 12.0, 11.5];
        let metrics = AccuracyMetrics::compute(&actual, &actual, "Close").unwrap();

        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, 0.0);
        assert_eq!(metrics.accuracy, 100.0);
        assert_eq!(metrics.r_squared, Some(1.0));
        assert_eq!(metrics.directional_accuracy, 100.0);
        assert_eq!(metrics.within_5_pct, 100.0);
        assert_eq!(metrics.error_bands.above_10_pct, 0.0);
    }

    #[test]
    fn test_error_metrics() {
        let actual = [100.0, 200.0];
        let predicted = [110.0, 190.0];
        let metrics = AccuracyMetrics::compute(&actual, &predicted, "Close").unwrap();

        assert_eq!(metrics.mae, 10.0);
        assert_eq!(metrics.mse, 100.0);
        assert_eq!(metrics.rmse, 10.0);
        // (10% + 5%) / 2
        assert!((metrics.mape - 7.5).abs() < 1e-12);
        assert!((metrics.accuracy - 92.5).abs() < 1e-12);
        // 5% is not below 5%
        assert_eq!(metrics.within_5_pct, 0.0);
        assert_eq!(metrics.within_10_pct, 50.0);
        assert_eq!(metrics.error_bands.from_5_to_10_pct, 50.0);
        assert_eq!(metrics.error_bands.above_10_pct, 50.0);
    }

    #[test]
    fn test_directional_accuracy_counts_first_row() {
        // Steps: up/down, down/down, up/up -> 2 of 3 steps agree, plus row 0
        let actual = [1.0, 2.0, 1.0, 3.0];
        let predicted = [1.0, 0.5, 0.4, 0.9];
        assert_eq!(directional_accuracy(&actual, &predicted), 75.0);
    }

    #[test]
    fn test_zero_actual_is_degenerate() {
        let result = AccuracyMetrics::compute(&[0.0, 1.0], &[0.1, 1.0], "Close");
        assert!(matches!(
            result,
            Err(PrepError::DegenerateColumn { ref column }) if column == "Close"
        ));
    }

    #[test]
    fn test_no_pairs_is_empty_result() {
        let result = AccuracyMetrics::compute(&[], &[], "Close");
        assert!(matches!(result, Err(PrepError::EmptyResult(_))));
    }

    #[test]
    fn test_constant_actual_has_no_r_squared() {
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 6.0]), None);
    }
}
