//! Augmented Dickey-Fuller unit-root test.
//!
//! H0: the series has a unit root (non-stationary).
//! H1: the series is stationary.
//!
//! The regression is `Δy_t = α + β·y_{t-1} + Σ γ_i·Δy_{t-i} + ε_t` with a
//! fixed lag count, solved by OLS; the statistic is the t ratio of β.

use crate::error::{PrepError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Significance level used to call a series stationary.
pub const SIGNIFICANCE: f64 = 0.05;

/// Shortest series the test is run on.
pub const MIN_OBSERVATIONS: usize = 10;

/// Critical values of the test statistic (constant, no trend).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    #[serde(rename = "1%")]
    pub one_pct: f64,
    #[serde(rename = "5%")]
    pub five_pct: f64,
    #[serde(rename = "10%")]
    pub ten_pct: f64,
}

impl CriticalValues {
    /// Asymptotic values with a finite-sample correction.
    pub fn for_sample_size(n: usize) -> Self {
        let n = n as f64;
        Self {
            one_pct: -3.43 - 6.0 / n,
            five_pct: -2.86 - 4.0 / n,
            ten_pct: -2.57 - 3.0 / n,
        }
    }
}

/// Outcome of one ADF test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    pub observations: usize,
    pub critical_values: CriticalValues,
    pub is_stationary: bool,
}

/// Default lag order: `⌊12·(n/100)^{1/4}⌋`, capped at `n/2 - 2`.
pub fn default_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Run the ADF test on a series without missing values.
pub fn adf_test(data: &[f64], lags: Option<usize>) -> Result<AdfResult> {
    let n = data.len();
    let lag = lags.unwrap_or_else(|| default_lag(n));
    let num_regressors = 2 + lag;

    // Need more observations than regressors after differencing and lagging
    let required = (lag + num_regressors + 2).max(MIN_OBSERVATIONS);
    if n < required {
        return Err(PrepError::InsufficientData {
            required,
            actual: n,
        });
    }

    let diff: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let effective_n = diff.len() - lag;

    // Rows: [1, y_{t-1}, Δy_{t-1}, ..., Δy_{t-lag}]
    let mut x_data = Vec::with_capacity(effective_n * num_regressors);
    for t in lag..diff.len() {
        x_data.push(1.0);
        x_data.push(data[t]);
        for i in 1..=lag {
            x_data.push(diff[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(effective_n, num_regressors, &x_data);
    let y = DVector::from_column_slice(&diff[lag..]);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y;
    let xtx_inv = xtx.try_inverse().ok_or_else(|| PrepError::DegenerateColumn {
        column: "ADF regressors".to_string(),
    })?;

    let beta = &xtx_inv * xty;
    let residuals = &y - &x * &beta;
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let mse = sse / (effective_n - num_regressors) as f64;
    let se_beta = (mse * xtx_inv[(1, 1)]).sqrt();

    if !se_beta.is_finite() || se_beta == 0.0 {
        return Err(PrepError::DegenerateColumn {
            column: "ADF level coefficient".to_string(),
        });
    }

    let statistic = beta[1] / se_beta;
    let critical_values = CriticalValues::for_sample_size(n);
    let p_value = mackinnon_p_value(statistic);

    Ok(AdfResult {
        statistic,
        p_value,
        lags: lag,
        observations: effective_n,
        critical_values,
        is_stationary: p_value <= SIGNIFICANCE,
    })
}

// MacKinnon (1994) response surface, one variable, constant only.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Asymptotic p-value of the ADF statistic from MacKinnon's (1994)
/// regression surface: the standard normal CDF of a polynomial in the
/// statistic.
pub fn mackinnon_p_value(t_stat: f64) -> f64 {
    if t_stat > TAU_MAX {
        return 1.0;
    }
    if t_stat < TAU_MIN {
        return 0.0;
    }
    let coefficients: &[f64] = if t_stat <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    let z = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * t_stat + c);
    Normal::standard().cdf(z)
}
