use crate::accuracy::AccuracyReport;
use crate::analysis::ExploratoryReport;
use crate::error::Result;
use crate::io::write_json_report;
use crate::types::CleaningSummary;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Which job produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Clean,
    Explore,
    Accuracy,
}

/// Envelope written for every job, to a file or to stdout with `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub job: JobKind,
    pub result: T,
}

/// Builds report envelopes, writes them and logs short summaries.
pub struct ReportGenerator {
    report_path: PathBuf,
}

impl ReportGenerator {
    /// Create a generator that writes to `report_path`.
    pub fn new(report_path: PathBuf) -> Self {
        Self { report_path }
    }

    /// Wrap a job result in a timestamped envelope.
    pub fn build<T: Serialize>(job: JobKind, result: T) -> Report<T> {
        Report {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            job,
            result,
        }
    }

    /// Write a report as pretty JSON, creating parent directories.
    pub fn write_report_to_file<T: Serialize>(&self, report: &Report<T>) -> Result<PathBuf> {
        write_json_report(report, &self.report_path)
    }

    /// Log the headline numbers of a cleaning run.
    pub fn log_cleaning_summary(summary: &CleaningSummary) {
        info!(
            "Rows: {} -> {} ({:.1}% removed)",
            summary.rows_before,
            summary.rows_after,
            summary.rows_removed_percentage()
        );
        info!(
            "Missing values ({}): {} -> {}",
            summary.missing_values.strategy,
            summary.missing_values.total_before(),
            summary.missing_values.total_after()
        );
        info!(
            "Outliers removed: {} (second pass would remove {})",
            summary.outliers.rows_removed, summary.comparison_outliers.rows_removed
        );
        info!(
            "Normalized columns: {}",
            summary
                .normalization
                .scaled
                .iter()
                .map(|s| s.column.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if let Some(path) = &summary.output_path {
            info!("Output: {}", path.display());
        }
    }

    /// Log the headline numbers of an exploratory run.
    pub fn log_exploratory_summary(report: &ExploratoryReport) {
        info!(
            "Period: {} to {} ({} rows)",
            report.start_date, report.end_date, report.rows
        );
        if let Some(trend) = &report.trend {
            info!(
                "Trend: {:+.4} per day (R² {:.4})",
                trend.slope, trend.r_squared
            );
        }
        if let Some(growth) = report.total_growth_pct {
            info!("Total growth: {:.2}%", growth);
        }
        if let Some(std) = report.volatility.daily_return_std {
            info!("Daily return std: {:.2}%", std);
        }
        if let Some(stationarity) = &report.stationarity {
            info!(
                "Stationary: close={} (p={:.4}), first difference={} (p={:.4})",
                stationarity.close.is_stationary,
                stationarity.close.p_value,
                stationarity.close_diff.is_stationary,
                stationarity.close_diff.p_value
            );
        }
        if let Some(outliers) = &report.volume.outliers {
            info!("Volume outlier days: {}", outliers.count);
        }
        if let (Some(best), Some(worst)) =
            (&report.seasonality.best_year, &report.seasonality.worst_year)
        {
            info!(
                "Best year: {} ({:.2}%), worst year: {} ({:.2}%)",
                best.year, best.return_pct, worst.year, worst.return_pct
            );
        }
    }

    /// Log the headline numbers of an accuracy run.
    pub fn log_accuracy_summary(report: &AccuracyReport) {
        let m = &report.metrics;
        info!("Matched rows: {}", m.matched_rows);
        info!(
            "MAE: {:.4}, RMSE: {:.4}, MAPE: {:.2}%",
            m.mae, m.rmse, m.mape
        );
        info!(
            "Accuracy: {:.2}%, direction: {:.2}%",
            m.accuracy, m.directional_accuracy
        );
        info!(
            "Errors < 5%: {:.2}%, < 10%: {:.2}%",
            m.within_5_pct, m.within_10_pct
        );
    }
}
