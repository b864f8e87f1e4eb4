//! Integration tests for the cleaning, exploratory and accuracy jobs.
//!
//! These tests verify end-to-end behavior using the CSV fixtures.

use equity_prep::utils::{column_options, total_nulls};
use equity_prep::{
    AccuracyConfig, AccuracyEvaluator, CleaningConfig, CleaningStage, ExploratoryAnalyzer,
    ExploreConfig, JobKind, MissingValueStrategy, Pipeline, PrepError, Report, ZeroVariancePolicy,
    load_dataset,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_path().join(name)
}

fn run_clean(config: CleaningConfig) -> equity_prep::Result<equity_prep::CleaningResult> {
    Pipeline::builder().config(config).build().unwrap().run()
}

fn column_mean(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    present.iter().sum::<f64>() / present.len() as f64
}

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_clean_fixture_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cleaned.csv");
    let report = dir.path().join("reports").join("clean.json");

    let result = run_clean(
        CleaningConfig::builder()
            .input_path(fixture("prices.csv"))
            .output_path(&output)
            .report_path(&report)
            .build()
            .unwrap(),
    )
    .unwrap();

    let summary = &result.summary;
    assert_eq!(summary.rows_before, 30);
    assert_eq!(summary.rows_after, 30);
    assert_eq!(summary.columns_after, 9);
    assert_eq!(summary.output_path.as_deref(), Some(output.as_path()));

    let written = load_dataset(&output).unwrap();
    let names: Vec<String> = written
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        vec!["Date", "Open", "High", "Low", "Close", "Volume", "Year", "Month", "Day"]
    );

    // Scaled columns have mean 0 and population std 1
    for name in ["Open", "High", "Low", "Close", "Volume"] {
        let values = column_options(&written, name).unwrap();
        let m = column_mean(&values);
        let var = values
            .iter()
            .flatten()
            .map(|v| (v - m).powi(2))
            .sum::<f64>()
            / values.len() as f64;
        assert!(m.abs() < 1e-9, "{} mean {}", name, m);
        assert!((var.sqrt() - 1.0).abs() < 1e-6, "{} std {}", name, var.sqrt());
    }

    // Temporal columns keep calendar values
    assert_eq!(column_options(&written, "Year").unwrap()[0], Some(2020.0));
    assert_eq!(column_options(&written, "Month").unwrap()[0], Some(1.0));
    assert_eq!(column_options(&written, "Day").unwrap()[0], Some(2.0));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["job"], "clean");
    assert_eq!(json["result"]["rows_after"], 30);
}

#[test]
fn test_clean_two_rows_keeps_extreme_volume() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("two_rows.csv");
    fs::write(
        &input,
        "Date,Open,High,Low,Close,Volume\n\
         2020-01-02,10.0,11.0,9.0,10.5,100\n\
         2020-01-03,12.0,13.0,11.0,12.5,100000000\n",
    )
    .unwrap();

    let result = run_clean(
        CleaningConfig::builder()
            .input_path(&input)
            .save_to_disk(false)
            .build()
            .unwrap(),
    )
    .unwrap();

    // Two points are never more than 0.71 sample std from their mean
    assert_eq!(result.summary.rows_after, 2);
    assert_eq!(result.summary.outliers.rows_removed, 0);
    assert_eq!(result.summary.output_path, None);
}

#[test]
fn test_clean_forward_fill_gaps() {
    let result = run_clean(
        CleaningConfig::builder()
            .input_path(fixture("prices_with_gaps.csv"))
            .missing_strategy(MissingValueStrategy::ForwardFill)
            .save_to_disk(false)
            .build()
            .unwrap(),
    )
    .unwrap();

    let missing = &result.summary.missing_values;
    assert_eq!(missing.total_before(), 3);
    assert_eq!(missing.total_after(), 0);
    assert_eq!(missing.rows_removed, 0);

    // The comparison view is not normalized, so filled values are visible
    let close = column_options(&result.comparison, "Close").unwrap();
    assert_eq!(close[1], Some(20.5));
    let volume = column_options(&result.comparison, "Volume").unwrap();
    assert_eq!(volume[2], Some(1700.0));
    let open = column_options(&result.comparison, "Open").unwrap();
    assert_eq!(open[4], Some(21.5));

    assert_eq!(total_nulls(&result.data), 0);
    assert_eq!(result.summary.rows_after, 6);
}

#[test]
fn test_clean_reads_missing_markers() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("markers.csv");
    fs::write(
        &input,
        "Date,Open,High,Low,Close,Volume\n\
         2021-03-01,20.0,21.0,19.5,20.5,1500\n\
         2021-03-02,20.5,21.5,20.0,NA,1700\n\
         2021-03-03,21.0,22.0,20.5,NaN,1650\n\
         2021-03-04,21.5,22.5,21.0,22.0,1600\n\
         2021-03-05,21.3,22.0,20.8,21.2,1800\n",
    )
    .unwrap();

    let result = run_clean(
        CleaningConfig::builder()
            .input_path(&input)
            .missing_strategy(MissingValueStrategy::Mean)
            .save_to_disk(false)
            .build()
            .unwrap(),
    )
    .unwrap();

    let summary = &result.summary;
    assert_eq!(summary.missing_values.total_before(), 2);
    assert_eq!(summary.missing_values.total_after(), 0);
    assert!(
        summary
            .normalization
            .scaled
            .iter()
            .any(|stats| stats.column == "Close")
    );

    // Both markers take the mean of the three present closes
    let close = column_options(&result.comparison, "Close").unwrap();
    let fill = (20.5 + 22.0 + 21.2) / 3.0;
    assert!((close[1].unwrap() - fill).abs() < 1e-9);
    assert!((close[2].unwrap() - fill).abs() < 1e-9);
    assert_eq!(total_nulls(&result.data), 0);
}

#[test]
fn test_clean_drop_strategy_removes_incomplete_rows() {
    let result = run_clean(
        CleaningConfig::builder()
            .input_path(fixture("prices_with_gaps.csv"))
            .missing_strategy(MissingValueStrategy::Drop)
            .save_to_disk(false)
            .build()
            .unwrap(),
    )
    .unwrap();

    assert_eq!(result.summary.missing_values.rows_removed, 3);
    assert_eq!(result.summary.rows_after, 3);
}

#[test]
fn test_clean_constant_column_fails_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cleaned.csv");

    let result = run_clean(
        CleaningConfig::builder()
            .input_path(fixture("constant_column.csv"))
            .output_path(&output)
            .build()
            .unwrap(),
    );

    match result {
        Err(PrepError::DegenerateColumn { column }) => assert_eq!(column, "Volume"),
        other => panic!("expected DegenerateColumn, got {:?}", other.map(|_| ())),
    }
    assert!(!output.exists(), "nothing is written after a failure");
}

#[test]
fn test_clean_constant_column_skip_policy() {
    let result = run_clean(
        CleaningConfig::builder()
            .input_path(fixture("constant_column.csv"))
            .zero_variance_policy(ZeroVariancePolicy::Skip)
            .save_to_disk(false)
            .build()
            .unwrap(),
    )
    .unwrap();

    assert_eq!(result.summary.normalization.skipped, vec!["Volume".to_string()]);
    assert_eq!(
        column_options(&result.data, "Volume").unwrap(),
        vec![Some(1000.0); 4]
    );
    assert!(
        result
            .summary
            .warnings
            .iter()
            .any(|w| w.contains("Volume"))
    );
}

#[test]
fn test_clean_missing_input_reports_not_found() {
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();

    let result = Pipeline::builder()
        .config(
            CleaningConfig::builder()
                .input_path(fixture("does_not_exist.csv"))
                .build()
                .unwrap(),
        )
        .on_progress(move |update| seen.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run();

    assert!(matches!(result, Err(PrepError::NotFound { .. })));
    assert_eq!(stages.lock().unwrap().last(), Some(&CleaningStage::Failed));
}

// ============================================================================
// Exploratory analysis
// ============================================================================

#[test]
fn test_explore_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("explore.json");

    let analysis = ExploratoryAnalyzer::new(ExploreConfig {
        input_path: fixture("prices.csv"),
        short_window: 5,
        long_window: 20,
        adf_lags: Some(1),
        report_path: Some(report_path.clone()),
    })
    .run()
    .unwrap();

    let report = &analysis.report;
    assert_eq!(report.rows, 30);
    assert_eq!(report.start_date, "2020-01-02");
    assert_eq!(report.end_date, "2020-02-12");
    assert!(report.trend.as_ref().unwrap().slope > 0.0);
    assert!(report.total_growth_pct.unwrap() > 0.0);
    assert!(report.moving_averages.last_short.is_some());
    assert!(report.moving_averages.last_long.is_some());
    assert!(report.stationarity.is_some());

    let ma_short = column_options(&analysis.data, "MA5").unwrap();
    assert_eq!(ma_short[3], None);
    assert!(ma_short[4].is_some());

    let written: Report<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written.job, JobKind::Explore);
    assert_eq!(written.result["rows"], 30);
}

// ============================================================================
// Forecast accuracy
// ============================================================================

#[test]
fn test_accuracy_fixture() {
    let report = AccuracyEvaluator::new(AccuracyConfig {
        actual_path: fixture("actual.csv"),
        predicted_path: fixture("predicted.csv"),
        ..AccuracyConfig::default()
    })
    .run()
    .unwrap();

    let m = &report.metrics;
    assert_eq!(m.matched_rows, 4);
    assert_eq!(report.first_date, "2021-01-05");
    assert_eq!(report.last_date, "2021-01-08");
    assert!((m.mae - 0.75).abs() < 1e-12);
    assert!((m.mse - 0.75).abs() < 1e-12);
    assert!((m.rmse - 0.75f64.sqrt()).abs() < 1e-12);
    assert_eq!(m.within_5_pct, 100.0);
    // First row agrees, then down/up, up/up, down/flat
    assert_eq!(m.directional_accuracy, 75.0);
}

#[test]
fn test_accuracy_missing_predicted_column() {
    let result = AccuracyEvaluator::new(AccuracyConfig {
        actual_path: fixture("actual.csv"),
        predicted_path: fixture("predicted.csv"),
        predicted_column: "Forecast".to_string(),
        ..AccuracyConfig::default()
    })
    .run();

    assert!(matches!(result, Err(PrepError::ColumnNotFound(ref c)) if c == "Forecast"));
}

#[test]
fn test_accuracy_no_overlap_is_empty_result() {
    let result = AccuracyEvaluator::new(AccuracyConfig {
        actual_path: fixture("prices.csv"),
        predicted_path: fixture("predicted.csv"),
        ..AccuracyConfig::default()
    })
    .run();

    assert!(matches!(result, Err(PrepError::EmptyResult(_))));
}
