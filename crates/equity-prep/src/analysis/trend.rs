//! Rolling, differencing and linear-trend helpers over price series.
//!
//! Series are `Option<f64>` slices: `None` marks a missing observation and
//! propagates to every derived value that depends on it.

use crate::profiler::mean;
use serde::{Deserialize, Serialize};

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

impl LinearTrend {
    /// Fitted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a straight line through `(x, y)` pairs.
///
/// Returns `None` with fewer than two points or when every `x` is equal.
pub fn linear_trend(x: &[f64], y: &[f64]) -> Option<LinearTrend> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let x_mean = mean(x)?;
    let y_mean = mean(y)?;
    let sxx: f64 = x.iter().map(|xi| (xi - x_mean).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum();

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    Some(LinearTrend {
        slope,
        intercept,
        r_squared,
    })
}

/// Mean of each trailing window; `None` until the window is full or when
/// the window holds a missing value.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice.iter().try_fold(0.0, |acc, v| v.map(|x| acc + x))?;
            Some(sum / window as f64)
        })
        .collect()
}

/// First difference, `None` in the first position.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for pair in values.windows(2) {
        out.push(match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        });
    }
    out
}

/// Percentage change between consecutive values (× 100), `None` in the
/// first position and wherever the previous value is missing or zero.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }
    out.push(None);
    for pair in values.windows(2) {
        out.push(match (pair[0], pair[1]) {
            (Some(prev), Some(cur)) if prev != 0.0 => Some((cur - prev) / prev * 100.0),
            _ => None,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_trend_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let trend = linear_trend(&x, &y).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.intercept - 1.0).abs() < 1e-12);
        assert!((trend.r_squared - 1.0).abs() < 1e-12);
        assert!((trend.predict(10.0) - 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_trend_degenerate() {
        assert!(linear_trend(&[1.0], &[1.0]).is_none());
        assert!(linear_trend(&[2.0, 2.0], &[1.0, 5.0]).is_none());
    }

    #[test]
    fn test_rolling_mean_waits_for_full_window() {
        let values = [Some(1.0), Some(2.0), Some(3.0), None, Some(5.0), Some(6.0)];
        assert_eq!(
            rolling_mean(&values, 2),
            vec![None, Some(1.5), Some(2.5), None, None, Some(5.5)]
        );
    }

    #[test]
    fn test_diff_and_pct_change() {
        let values = [Some(10.0), Some(11.0), None, Some(0.0), Some(5.0)];
        assert_eq!(diff(&values), vec![None, Some(1.0), None, None, Some(5.0)]);

        let pct = pct_change(&values);
        assert_eq!(pct[0], None);
        assert!((pct[1].unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(pct[2], None);
        // Previous value is zero
        assert_eq!(pct[4], None);
    }
}
