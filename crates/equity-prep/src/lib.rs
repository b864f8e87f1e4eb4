//! Equity Price Preparation Library
//!
//! Cleaning, exploratory analysis and forecast scoring for the daily price
//! history of a single listed equity, built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides three batch jobs over OHLCV price files
//! (`Date, Open, High, Low, Close, Volume`):
//!
//! - **Cleaning**: missing-value resolution, z-score outlier removal, date
//!   field derivation and z-score normalization, persisted as CSV
//! - **Exploratory analysis**: returns, ranges, moving averages, trend fit,
//!   volume outliers, seasonality and an Augmented Dickey-Fuller test
//! - **Forecast accuracy**: date-joined error metrics between a cleaned
//!   history and a forecast file
//! - **Progress Reporting**: stage-by-stage updates for the cleaning job
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use equity_prep::{CleaningConfig, MissingValueStrategy, Pipeline};
//!
//! let config = CleaningConfig::builder()
//!     .input_path("data/prices.csv")
//!     .output_path("data/cleaned.csv")
//!     .missing_strategy(MissingValueStrategy::ForwardFill)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! println!("Rows kept: {}", result.summary.rows_after);
//! ```
//!
//! Tables that are already in memory go through [`Pipeline::process`]
//! instead of [`Pipeline::run`].
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result<T>`](error::Result) with a
//! [`PrepError`]. Errors are fatal for the run they occur in; nothing is
//! retried and nothing is written after a failure.

pub mod accuracy;
pub mod analysis;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use config::{
    AccuracyConfig, CleaningConfig, CleaningConfigBuilder, ConfigValidationError, ExploreConfig,
    MissingValueStrategy, ZeroVariancePolicy,
};
pub use error::{PrepError, Result, ResultExt};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use types::{CleaningResult, CleaningSummary};

// Re-export progress types
pub use pipeline::{CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate};

// Re-export stage components
pub use imputers::{MissingValueHandler, MissingValueReport};
pub use pipeline::{
    DateFieldDeriver, NormalizationReport, Normalizer, OutlierFilter, OutlierReport,
};

// Re-export analysis and scoring
pub use accuracy::{AccuracyEvaluator, AccuracyMetrics, AccuracyReport};
pub use analysis::{ExploratoryAnalysis, ExploratoryAnalyzer, ExploratoryReport};

// Re-export I/O and reporting
pub use io::{load_dataset, load_prices, persist_dataset};
pub use profiler::{ColumnDescription, describe};
pub use reporting::{JobKind, Report, ReportGenerator};
