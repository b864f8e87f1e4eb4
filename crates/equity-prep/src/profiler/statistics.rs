//! Statistical primitives and descriptive statistics for numeric columns.

use crate::utils::{column_options, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom.
///
/// Returns `None` when there are not more than `ddof` observations.
pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - ddof) as f64;
    Some(variance.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be sorted ascending; `q` is in [0, 1].
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Pearson correlation of two equally long samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx).powi(2);
        vy += (b - my).powi(2);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

/// Mean and standard deviation of one column at one point in the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
}

impl ColumnStats {
    /// Compute stats over the non-missing values of a column.
    ///
    /// Returns `None` when the standard deviation is undefined for `ddof`.
    pub fn compute(column: impl Into<String>, values: &[f64], ddof: usize) -> Option<Self> {
        Some(Self {
            column: column.into(),
            count: values.len(),
            mean: mean(values)?,
            std: std_dev(values, ddof)?,
        })
    }
}

/// Summary statistics of one numeric column (count, mean, std, quartiles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnDescription {
    /// Describe a sample of non-missing values.
    pub fn from_values(column: impl Into<String>, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            column: column.into(),
            count: values.len(),
            mean: mean(values),
            std: std_dev(values, 1),
            min: sorted.first().copied(),
            q25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Describe every numeric column of a table.
pub fn describe(df: &DataFrame) -> PolarsResult<Vec<ColumnDescription>> {
    let mut out = Vec::new();
    for col in df.get_columns() {
        if !is_numeric_dtype(col.dtype()) {
            continue;
        }
        let name = col.name().to_string();
        let values: Vec<f64> = column_options(df, &name)?.into_iter().flatten().collect();
        out.push(ColumnDescription::from_values(name, &values));
    }
    Ok(out)
}
