//! CLI entry point for the price cleaning, exploration and accuracy jobs.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use equity_prep::config::{
    DEFAULT_ACTUAL_PATH, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_PREDICTED_PATH,
};
use equity_prep::{
    AccuracyConfig, AccuracyEvaluator, AccuracyReport, CleaningConfig, CleaningSummary,
    ExploratoryAnalyzer, ExploratoryReport, ExploreConfig, JobKind, MissingValueStrategy,
    Pipeline, ReportGenerator, ZeroVariancePolicy,
};
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible missing value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Replace missing numeric values with the column mean
    Mean,
    /// Drop rows with any missing value
    Drop,
    /// Carry the previous value forward
    #[value(alias = "forward_fill")]
    ForwardFill,
    /// Carry the next value backward
    #[value(alias = "backward_fill")]
    BackwardFill,
}

impl From<CliMissingStrategy> for MissingValueStrategy {
    fn from(cli: CliMissingStrategy) -> Self {
        match cli {
            CliMissingStrategy::Mean => MissingValueStrategy::Mean,
            CliMissingStrategy::Drop => MissingValueStrategy::Drop,
            CliMissingStrategy::ForwardFill => MissingValueStrategy::ForwardFill,
            CliMissingStrategy::BackwardFill => MissingValueStrategy::BackwardFill,
        }
    }
}

/// CLI-compatible zero-variance policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliZeroVariance {
    /// Abort the run
    Fail,
    /// Leave the column unscaled and warn
    Skip,
}

impl From<CliZeroVariance> for ZeroVariancePolicy {
    fn from(cli: CliZeroVariance) -> Self {
        match cli {
            CliZeroVariance::Fail => ZeroVariancePolicy::Fail,
            CliZeroVariance::Skip => ZeroVariancePolicy::Skip,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Equity price history cleaning and analysis",
    long_about = "Batch jobs over a daily OHLCV price file.\n\n\
                  EXAMPLES:\n  \
                  # Clean with the default paths\n  \
                  equity-prep clean\n\n  \
                  # Forward-fill gaps and keep constant columns unscaled\n  \
                  equity-prep clean -i prices.csv --strategy forward-fill --zero-variance skip\n\n  \
                  # Exploratory statistics as JSON\n  \
                  equity-prep --json explore -i prices.csv\n\n  \
                  # Score a forecast\n  \
                  equity-prep accuracy --actual history.csv --predicted forecast.csv"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean a raw price file and write the normalized table
    Clean {
        /// Raw price file
        #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
        input: PathBuf,

        /// Cleaned CSV output
        #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,

        /// Strategy for missing values
        #[arg(long, value_enum, default_value = "mean")]
        strategy: CliMissingStrategy,

        /// Z-score threshold for outlier removal
        #[arg(long, default_value = "3.0")]
        z_threshold: f64,

        /// What to do with a zero-variance column during normalization
        #[arg(long, value_enum, default_value = "fail")]
        zero_variance: CliZeroVariance,

        /// Keep the result in memory only
        #[arg(long)]
        no_save: bool,

        /// Write a JSON report of the run to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Compute exploratory statistics for a price file
    Explore {
        /// Price file
        #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
        input: PathBuf,

        /// Short moving-average window
        #[arg(long, default_value = "50")]
        short_window: usize,

        /// Long moving-average window
        #[arg(long, default_value = "200")]
        long_window: usize,

        /// Lag order for the ADF test (default: Schwert rule)
        #[arg(long)]
        adf_lags: Option<usize>,

        /// Write a JSON report of the run to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Score a forecast file against the actual price history
    Accuracy {
        /// Ground-truth price file
        #[arg(long, default_value = DEFAULT_ACTUAL_PATH)]
        actual: PathBuf,

        /// Forecast file
        #[arg(long, default_value = DEFAULT_PREDICTED_PATH)]
        predicted: PathBuf,

        /// Price column in the actual file
        #[arg(long, default_value = "Close")]
        actual_column: String,

        /// Price column in the forecast file
        #[arg(long, default_value = "Close Previsto")]
        predicted_column: String,

        /// Write a JSON report of the run to this path
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let outcome = match args.command {
        Command::Clean {
            input,
            output,
            strategy,
            z_threshold,
            zero_variance,
            no_save,
            report,
        } => {
            let mut builder = CleaningConfig::builder()
                .input_path(input)
                .output_path(output)
                .missing_strategy(strategy.into())
                .z_threshold(z_threshold)
                .zero_variance_policy(zero_variance.into())
                .save_to_disk(!no_save);
            if let Some(path) = report {
                builder = builder.report_path(path);
            }
            run_clean(builder.build()?, args.json, args.quiet)
        }
        Command::Explore {
            input,
            short_window,
            long_window,
            adf_lags,
            report,
        } => {
            let config = ExploreConfig {
                input_path: input,
                short_window,
                long_window,
                adf_lags,
                report_path: report,
            };
            config.validate()?;
            run_explore(config, args.json)
        }
        Command::Accuracy {
            actual,
            predicted,
            actual_column,
            predicted_column,
            report,
        } => run_accuracy(
            AccuracyConfig {
                actual_path: actual,
                predicted_path: predicted,
                actual_column,
                predicted_column,
                report_path: report,
            },
            args.json,
        ),
    };

    outcome.map_err(|e| {
        error!("{}", e);
        e
    })
}

fn run_clean(config: CleaningConfig, json: bool, quiet: bool) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting price cleaning pipeline...");
    info!("{}", "=".repeat(80));

    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(move |update| {
            if !quiet && !json {
                match &update.sub_stage {
                    Some(sub) => info!(
                        "[{:>3.0}%] {} ({}): {}",
                        update.progress * 100.0,
                        update.stage.display_name(),
                        sub,
                        update.message
                    ),
                    None => info!(
                        "[{:>3.0}%] {}: {}",
                        update.progress * 100.0,
                        update.stage.display_name(),
                        update.message
                    ),
                }
            }
        })
        .build()?;

    let result = pipeline
        .run()
        .map_err(|e| anyhow!("Cleaning failed: {} ({})", e, e.error_code()))?;

    if json {
        let report = ReportGenerator::build(JobKind::Clean, &result.summary);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ReportGenerator::log_cleaning_summary(&result.summary);
    print_cleaning_summary(&result.summary);
    Ok(())
}

fn run_explore(config: ExploreConfig, json: bool) -> Result<()> {
    let analysis = ExploratoryAnalyzer::new(config).run()?;

    if json {
        let report = ReportGenerator::build(JobKind::Explore, &analysis.report);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ReportGenerator::log_exploratory_summary(&analysis.report);
    print_exploratory_summary(&analysis.report);
    Ok(())
}

fn run_accuracy(config: AccuracyConfig, json: bool) -> Result<()> {
    let report = AccuracyEvaluator::new(config).run()?;

    if json {
        let envelope = ReportGenerator::build(JobKind::Accuracy, &report);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    ReportGenerator::log_accuracy_summary(&report);
    print_accuracy_summary(&report);
    Ok(())
}

/// Print the final result of a cleaning run.
///
/// Uses `println!` so the result stays visible with `--quiet`.
fn print_cleaning_summary(summary: &CleaningSummary) {
    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    if let Some(input) = &summary.input_path {
        println!(
            "Input:  {} ({} rows x {} columns)",
            input.display(),
            summary.rows_before,
            summary.columns_before
        );
    }
    match &summary.output_path {
        Some(output) => println!(
            "Output: {} ({} rows x {} columns)",
            output.display(),
            summary.rows_after,
            summary.columns_after
        ),
        None => println!(
            "Output: not saved ({} rows x {} columns)",
            summary.rows_after, summary.columns_after
        ),
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({:.1}% removed)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed_percentage()
    );
    println!(
        "  Missing values ({}): {} -> {}",
        summary.missing_values.strategy,
        summary.missing_values.total_before(),
        summary.missing_values.total_after()
    );
    println!(
        "  Outliers removed: {} (|z| > {})",
        summary.outliers.rows_removed, summary.outliers.threshold
    );
    println!(
        "  Normalized: {} columns, skipped: {}",
        summary.normalization.scaled.len(),
        summary.normalization.skipped.len()
    );

    if !summary.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
    }
    println!();
}

fn print_exploratory_summary(report: &ExploratoryReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("EXPLORATORY ANALYSIS");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Period: {} to {} ({} rows)",
        report.start_date, report.end_date, report.rows
    );
    if let Some(growth) = report.total_growth_pct {
        println!("Total growth: {:.2}%", growth);
    }
    if let Some(trend) = &report.trend {
        println!(
            "Trend: {:+.4} per day (R² {:.4})",
            trend.slope, trend.r_squared
        );
    }
    match &report.stationarity {
        Some(s) => {
            println!(
                "ADF close: statistic {:.4}, p-value {:.4} ({})",
                s.close.statistic,
                s.close.p_value,
                stationary_label(s.close.is_stationary)
            );
            println!(
                "ADF first difference: statistic {:.4}, p-value {:.4} ({})",
                s.close_diff.statistic,
                s.close_diff.p_value,
                stationary_label(s.close_diff.is_stationary)
            );
        }
        None => println!("ADF: series too short"),
    }
    println!();
}

fn stationary_label(stationary: bool) -> &'static str {
    if stationary {
        "stationary"
    } else {
        "non-stationary"
    }
}

fn print_accuracy_summary(report: &AccuracyReport) {
    let m = &report.metrics;
    println!();
    println!("{}", "=".repeat(80));
    println!("FORECAST ACCURACY");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "{} vs {}: {} matched rows ({} to {})",
        report.actual_column, report.predicted_column, m.matched_rows, report.first_date,
        report.last_date
    );
    println!("  MAE:  {:.4}", m.mae);
    println!("  MSE:  {:.4}", m.mse);
    println!("  RMSE: {:.4}", m.rmse);
    println!("  MAPE: {:.2}%", m.mape);
    if let Some(r2) = m.r_squared {
        println!("  R²:   {:.4}", r2);
    }
    println!("  Accuracy: {:.2}%", m.accuracy);
    println!("  Directional accuracy: {:.2}%", m.directional_accuracy);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed_strategy(value: &str) -> Option<MissingValueStrategy> {
        match Args::try_parse_from(["equity-prep", "clean", "--strategy", value]).ok()?.command {
            Command::Clean { strategy, .. } => Some(strategy.into()),
            _ => None,
        }
    }

    #[test]
    fn test_strategy_spellings() {
        assert_eq!(parsed_strategy("mean"), Some(MissingValueStrategy::Mean));
        assert_eq!(parsed_strategy("drop"), Some(MissingValueStrategy::Drop));
        assert_eq!(parsed_strategy("forward_fill"), Some(MissingValueStrategy::ForwardFill));
        assert_eq!(parsed_strategy("forward-fill"), Some(MissingValueStrategy::ForwardFill));
        assert_eq!(parsed_strategy("backward_fill"), Some(MissingValueStrategy::BackwardFill));
        assert_eq!(parsed_strategy("backward-fill"), Some(MissingValueStrategy::BackwardFill));
        assert_eq!(parsed_strategy("median"), None);
    }

    #[test]
    fn test_clean_defaults() {
        let args = Args::try_parse_from(["equity-prep", "clean"]).unwrap();
        match args.command {
            Command::Clean {
                input,
                output,
                z_threshold,
                no_save,
                ..
            } => {
                assert_eq!(input, PathBuf::from(DEFAULT_INPUT_PATH));
                assert_eq!(output, PathBuf::from(DEFAULT_OUTPUT_PATH));
                assert_eq!(z_threshold, 3.0);
                assert!(!no_save);
            }
            other => panic!("expected clean, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["equity-prep", "explore", "--json", "-q"]).unwrap();
        assert!(args.json);
        assert!(args.quiet);
    }
}
