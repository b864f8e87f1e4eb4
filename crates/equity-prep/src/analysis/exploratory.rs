//! Exploratory analysis of a daily price series.

use super::stationarity::{AdfResult, adf_test};
use super::trend::{LinearTrend, diff, linear_trend, pct_change, rolling_mean};
use crate::config::ExploreConfig;
use crate::error::{PrepError, Result};
use crate::io::{REQUIRED_PRICE_COLUMNS, load_prices, require_columns};
use crate::pipeline::dates::{CANONICAL_DATE_FORMAT, DATE_COLUMN, parse_date_column};
use crate::profiler::{mean, pearson, quantile_sorted, std_dev};
use crate::reporting::{JobKind, ReportGenerator};
use crate::utils::column_options;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A value and the date it was observed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

/// ADF results for the closing price and its first difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    pub close: AdfResult,
    pub close_diff: AdfResult,
}

/// Daily return and intraday range statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySummary {
    /// Sample standard deviation of daily returns, in percent.
    pub daily_return_std: Option<f64>,
    /// Mean of (High - Low) / Low, in percent.
    pub mean_range_pct: Option<f64>,
    pub max_daily_return: Option<DatedValue>,
    pub min_daily_return: Option<DatedValue>,
}

/// Volume days outside the interquartile fences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeOutliers {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub count: usize,
    pub dates: Vec<String>,
}

/// Trading volume statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub mean: Option<f64>,
    pub max: Option<DatedValue>,
    /// Pearson correlation between Volume and Price_Change_Pct.
    pub price_change_correlation: Option<f64>,
    pub outliers: Option<VolumeOutliers>,
}

/// Mean closing price for one calendar month (1-12), across all years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMean {
    pub month: u32,
    pub mean_close: f64,
}

/// Close-to-close return within one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyReturn {
    pub year: i32,
    pub return_pct: f64,
}

/// Monthly and yearly patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub monthly_mean_close: Vec<MonthlyMean>,
    pub best_month: Option<MonthlyMean>,
    pub worst_month: Option<MonthlyMean>,
    pub yearly_returns: Vec<YearlyReturn>,
    pub best_year: Option<YearlyReturn>,
    pub worst_year: Option<YearlyReturn>,
}

/// Last values of the short and long moving averages of Close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverages {
    pub short_window: usize,
    pub long_window: usize,
    pub last_short: Option<f64>,
    pub last_long: Option<f64>,
}

/// Everything the exploratory job computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploratoryReport {
    pub rows: usize,
    pub start_date: String,
    pub end_date: String,
    /// Close regressed on days since the first date.
    pub trend: Option<LinearTrend>,
    pub total_growth_pct: Option<f64>,
    pub moving_averages: MovingAverages,
    /// `None` when the series is too short for the test.
    pub stationarity: Option<StationarityReport>,
    pub volatility: VolatilitySummary,
    pub volume: VolumeSummary,
    pub seasonality: Seasonality,
}

/// Output of [`ExploratoryAnalyzer::analyze`].
#[derive(Debug, Clone)]
pub struct ExploratoryAnalysis {
    /// Input table with the derived columns appended.
    pub data: DataFrame,
    pub report: ExploratoryReport,
}

/// Computes derived columns and summary statistics for a price table.
pub struct ExploratoryAnalyzer {
    config: ExploreConfig,
}

impl Default for ExploratoryAnalyzer {
    fn default() -> Self {
        Self::new(ExploreConfig::default())
    }
}

impl ExploratoryAnalyzer {
    pub fn new(config: ExploreConfig) -> Self {
        Self { config }
    }

    /// Load the configured price file, analyze it and write the JSON report
    /// when a report path is configured.
    pub fn run(&self) -> Result<ExploratoryAnalysis> {
        let df = load_prices(&self.config.input_path)?;
        let analysis = self.analyze(&df)?;

        if let Some(path) = &self.config.report_path {
            ReportGenerator::new(path.clone())
                .write_report_to_file(&ReportGenerator::build(JobKind::Explore, &analysis.report))?;
        }
        Ok(analysis)
    }

    /// Analyze a price table whose rows are in date order.
    pub fn analyze(&self, df: &DataFrame) -> Result<ExploratoryAnalysis> {
        require_columns(df, &REQUIRED_PRICE_COLUMNS)?;
        if df.height() < 2 {
            return Err(PrepError::InsufficientData {
                required: 2,
                actual: df.height(),
            });
        }

        let dates = parse_date_column(df, DATE_COLUMN)?;
        let open = column_options(df, "Open")?;
        let high = column_options(df, "High")?;
        let low = column_options(df, "Low")?;
        let close = column_options(df, "Close")?;
        let volume = column_options(df, "Volume")?;

        info!("Analyzing {} rows of price data", df.height());

        // Derived columns
        let daily_return = pct_change(&close);
        let daily_range = zip_with(&high, &low, |h, l| Some(h - l));
        let range_pct = zip_with(&daily_range, &low, ratio_pct);
        let price_change = zip_with(&close, &open, |c, o| Some(c - o));
        let price_change_pct = zip_with(&price_change, &open, ratio_pct);
        let (Some(first_date), Some(last_date)) =
            (dates.iter().min().copied(), dates.iter().max().copied())
        else {
            return Err(PrepError::InsufficientData {
                required: 2,
                actual: 0,
            });
        };
        let days: Vec<f64> = dates
            .iter()
            .map(|d| (*d - first_date).num_days() as f64)
            .collect();
        let ma_short = rolling_mean(&close, self.config.short_window);
        let ma_long = rolling_mean(&close, self.config.long_window);

        let mut data = df.clone();
        data.with_column(Series::new("Daily_Return".into(), daily_return.clone()))?;
        data.with_column(Series::new("Daily_Range".into(), daily_range))?;
        data.with_column(Series::new("Range_Pct".into(), range_pct.clone()))?;
        data.with_column(Series::new("Price_Change".into(), price_change))?;
        data.with_column(Series::new("Price_Change_Pct".into(), price_change_pct.clone()))?;
        data.with_column(Series::new("Days".into(), days.clone()))?;
        data.with_column(Series::new(
            format!("MA{}", self.config.short_window).into(),
            ma_short.clone(),
        ))?;
        data.with_column(Series::new(
            format!("MA{}", self.config.long_window).into(),
            ma_long.clone(),
        ))?;

        // Trend over rows with a closing price
        let (trend_x, trend_y): (Vec<f64>, Vec<f64>) = days
            .iter()
            .zip(&close)
            .filter_map(|(d, c)| c.map(|c| (*d, c)))
            .unzip();
        let trend = linear_trend(&trend_x, &trend_y);
        let total_growth_pct = match (trend_y.first(), trend_y.last()) {
            (Some(first), Some(last)) if *first != 0.0 => Some((last / first - 1.0) * 100.0),
            _ => None,
        };

        let report = ExploratoryReport {
            rows: df.height(),
            start_date: format_date(first_date),
            end_date: format_date(last_date),
            trend,
            total_growth_pct,
            moving_averages: MovingAverages {
                short_window: self.config.short_window,
                long_window: self.config.long_window,
                last_short: ma_short.last().copied().flatten(),
                last_long: ma_long.last().copied().flatten(),
            },
            stationarity: self.stationarity(&close),
            volatility: VolatilitySummary {
                daily_return_std: std_dev(&present(&daily_return), 1),
                mean_range_pct: mean(&present(&range_pct)),
                max_daily_return: extreme(&dates, &daily_return, |a, b| a > b),
                min_daily_return: extreme(&dates, &daily_return, |a, b| a < b),
            },
            volume: VolumeSummary {
                mean: mean(&present(&volume)),
                max: extreme(&dates, &volume, |a, b| a > b),
                price_change_correlation: paired_correlation(&volume, &price_change_pct),
                outliers: volume_outliers(&dates, &volume),
            },
            seasonality: seasonality(&dates, &close),
        };

        Ok(ExploratoryAnalysis { data, report })
    }

    fn stationarity(&self, close: &[Option<f64>]) -> Option<StationarityReport> {
        let levels = present(close);
        let differences = present(&diff(close));

        let result = adf_test(&levels, self.config.adf_lags).and_then(|close| {
            Ok(StationarityReport {
                close,
                close_diff: adf_test(&differences, self.config.adf_lags)?,
            })
        });

        match result {
            Ok(report) => {
                debug!(
                    "ADF: close p={:.4}, diff p={:.4}",
                    report.close.p_value, report.close_diff.p_value
                );
                Some(report)
            }
            Err(e) => {
                warn!("Skipping stationarity test: {}", e);
                None
            }
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

fn zip_with(
    a: &[Option<f64>],
    b: &[Option<f64>],
    f: impl Fn(f64, f64) -> Option<f64>,
) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

fn ratio_pct(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator != 0.0).then(|| numerator / denominator * 100.0)
}

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// First row whose value beats every other under `better`.
fn extreme(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    better: impl Fn(f64, f64) -> bool,
) -> Option<DatedValue> {
    let mut best: Option<(usize, f64)> = None;
    for (i, value) in values.iter().enumerate() {
        if let Some(v) = *value
            && best.is_none_or(|(_, b)| better(v, b))
        {
            best = Some((i, v));
        }
    }
    best.map(|(i, value)| DatedValue {
        date: format_date(dates[i]),
        value,
    })
}

fn paired_correlation(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    pearson(&xs, &ys)
}

fn volume_outliers(dates: &[NaiveDate], volume: &[Option<f64>]) -> Option<VolumeOutliers> {
    let mut sorted = present(volume);
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let outlier_dates: Vec<String> = dates
        .iter()
        .zip(volume)
        .filter_map(|(d, v)| match v {
            Some(v) if *v < lower_fence || *v > upper_fence => Some(format_date(*d)),
            _ => None,
        })
        .collect();

    Some(VolumeOutliers {
        q1,
        q3,
        iqr,
        lower_fence,
        upper_fence,
        count: outlier_dates.len(),
        dates: outlier_dates,
    })
}

fn seasonality(dates: &[NaiveDate], close: &[Option<f64>]) -> Seasonality {
    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for (date, value) in dates.iter().zip(close) {
        if let Some(v) = value {
            by_month.entry(date.month()).or_default().push(*v);
            by_year.entry(date.year()).or_default().push(*v);
        }
    }

    let monthly_mean_close: Vec<MonthlyMean> = by_month
        .into_iter()
        .filter_map(|(month, values)| {
            Some(MonthlyMean {
                month,
                mean_close: mean(&values)?,
            })
        })
        .collect();

    let yearly_returns: Vec<YearlyReturn> = by_year
        .into_iter()
        .filter_map(|(year, values)| {
            let first = *values.first()?;
            let last = *values.last()?;
            (first != 0.0).then(|| YearlyReturn {
                year,
                return_pct: (last / first - 1.0) * 100.0,
            })
        })
        .collect();

    Seasonality {
        best_month: first_by(&monthly_mean_close, |m| m.mean_close, |a, b| a > b),
        worst_month: first_by(&monthly_mean_close, |m| m.mean_close, |a, b| a < b),
        best_year: first_by(&yearly_returns, |y| y.return_pct, |a, b| a > b),
        worst_year: first_by(&yearly_returns, |y| y.return_pct, |a, b| a < b),
        monthly_mean_close,
        yearly_returns,
    }
}

fn first_by<T: Clone>(
    items: &[T],
    key: impl Fn(&T) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> Option<T> {
    let mut best: Option<&T> = None;
    for item in items {
        if best.is_none_or(|b| better(key(item), key(b))) {
            best = Some(item);
        }
    }
    best.cloned()
}
