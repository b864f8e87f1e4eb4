//! Forecast accuracy scoring.
//!
//! Joins a ground-truth price file with a forecast file on date and scores
//! the forecast with error, accuracy and direction metrics.

mod metrics;

pub use metrics::{AccuracyMetrics, ErrorBands, directional_accuracy, r_squared};

use crate::config::AccuracyConfig;
use crate::error::{PrepError, Result};
use crate::io::{load_dataset, require_columns};
use crate::pipeline::dates::{CANONICAL_DATE_FORMAT, DATE_COLUMN, parse_date_column};
use crate::reporting::{JobKind, ReportGenerator};
use crate::utils::column_options;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Accuracy job output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub actual_column: String,
    pub predicted_column: String,
    pub first_date: String,
    pub last_date: String,
    /// Matched rows skipped because one side had no value.
    pub skipped_missing: usize,
    #[serde(flatten)]
    pub metrics: AccuracyMetrics,
}

/// A matched (date, actual, predicted) row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedRow {
    pub date: NaiveDate,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
}

/// Scores a forecast against the actual series.
pub struct AccuracyEvaluator {
    config: AccuracyConfig,
}

impl Default for AccuracyEvaluator {
    fn default() -> Self {
        Self::new(AccuracyConfig::default())
    }
}

impl AccuracyEvaluator {
    pub fn new(config: AccuracyConfig) -> Self {
        Self { config }
    }

    /// Load both configured files and score them.
    pub fn run(&self) -> Result<AccuracyReport> {
        let actual = load_dataset(&self.config.actual_path)?;
        let predicted = load_dataset(&self.config.predicted_path)?;
        let report = self.evaluate(&actual, &predicted)?;

        if let Some(path) = &self.config.report_path {
            ReportGenerator::new(path.clone())
                .write_report_to_file(&ReportGenerator::build(JobKind::Accuracy, &report))?;
        }
        Ok(report)
    }

    /// Score already-loaded tables.
    pub fn evaluate(&self, actual: &DataFrame, predicted: &DataFrame) -> Result<AccuracyReport> {
        let rows = self.join(actual, predicted)?;
        info!("Matched dates: {}", rows.len());

        let complete: Vec<(NaiveDate, f64, f64)> = rows
            .iter()
            .filter_map(|r| Some((r.date, r.actual?, r.predicted?)))
            .collect();
        let skipped_missing = rows.len() - complete.len();
        if skipped_missing > 0 {
            warn!("Skipping {} matched rows with missing values", skipped_missing);
        }

        let actual_values: Vec<f64> = complete.iter().map(|(_, a, _)| *a).collect();
        let predicted_values: Vec<f64> = complete.iter().map(|(_, _, p)| *p).collect();
        let metrics =
            AccuracyMetrics::compute(&actual_values, &predicted_values, &self.config.actual_column)?;

        let format = |d: Option<&(NaiveDate, f64, f64)>| {
            d.map(|(date, _, _)| date.format(CANONICAL_DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        Ok(AccuracyReport {
            actual_column: self.config.actual_column.clone(),
            predicted_column: self.config.predicted_column.clone(),
            first_date: format(complete.first()),
            last_date: format(complete.last()),
            skipped_missing,
            metrics,
        })
    }

    /// Inner join on calendar date, in the actual table's row order.
    ///
    /// A date present several times on either side yields every pairing,
    /// ordered by actual row and then by predicted row.
    pub fn join(&self, actual: &DataFrame, predicted: &DataFrame) -> Result<Vec<MatchedRow>> {
        require_columns(actual, &[DATE_COLUMN, self.config.actual_column.as_str()])?;
        require_columns(predicted, &[DATE_COLUMN, self.config.predicted_column.as_str()])?;

        let left = keyed_frame(
            &parse_date_column(actual, DATE_COLUMN)?,
            column_options(actual, &self.config.actual_column)?,
            ACTUAL_VALUE,
            ACTUAL_ROW,
        )?;
        let right = keyed_frame(
            &parse_date_column(predicted, DATE_COLUMN)?,
            column_options(predicted, &self.config.predicted_column)?,
            PREDICTED_VALUE,
            PREDICTED_ROW,
        )?;

        let joined = left
            .lazy()
            .join(
                right.lazy(),
                [col(DATE_COLUMN)],
                [col(DATE_COLUMN)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort([ACTUAL_ROW, PREDICTED_ROW], SortMultipleOptions::default())
            .collect()?;

        if joined.height() == 0 {
            return Err(PrepError::EmptyResult(
                "no matching dates between actual and predicted series".to_string(),
            ));
        }

        let dates = parse_date_column(&joined, DATE_COLUMN)?;
        let actual_values = column_options(&joined, ACTUAL_VALUE)?;
        let predicted_values = column_options(&joined, PREDICTED_VALUE)?;

        Ok(dates
            .into_iter()
            .zip(actual_values)
            .zip(predicted_values)
            .map(|((date, actual), predicted)| MatchedRow {
                date,
                actual,
                predicted,
            })
            .collect())
    }
}

const ACTUAL_VALUE: &str = "actual_value";
const ACTUAL_ROW: &str = "actual_row";
const PREDICTED_VALUE: &str = "predicted_value";
const PREDICTED_ROW: &str = "predicted_row";

/// Canonical date key, value and source row number of one side of the join.
fn keyed_frame(
    dates: &[NaiveDate],
    values: Vec<Option<f64>>,
    value_name: &str,
    row_name: &str,
) -> Result<DataFrame> {
    let keys: Vec<String> = dates
        .iter()
        .map(|d| d.format(CANONICAL_DATE_FORMAT).to_string())
        .collect();
    let rows: Vec<u32> = (0..dates.len() as u32).collect();

    Ok(DataFrame::new(vec![
        Series::new(DATE_COLUMN.into(), keys).into_column(),
        Series::new(value_name.into(), values).into_column(),
        Series::new(row_name.into(), rows).into_column(),
    ])?)
}
