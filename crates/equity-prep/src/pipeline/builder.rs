//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning workflow:
//! load → missing values → outliers → date fields → normalization → persist.

use crate::config::CleaningConfig;
use crate::error::Result;
use crate::imputers::MissingValueHandler;
use crate::io::{load_prices, persist_dataset};
use crate::pipeline::dates::DateFieldDeriver;
use crate::pipeline::normalizer::Normalizer;
use crate::pipeline::outliers::OutlierFilter;
use crate::pipeline::progress::{
    CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::profiler::describe;
use crate::reporting::{JobKind, ReportGenerator};
use crate::types::{CleaningResult, CleaningSummary};
use crate::utils::numeric_column_names;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// The cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use equity_prep::{CleaningConfig, MissingValueStrategy, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(
///         CleaningConfig::builder()
///             .input_path("data/prices.csv")
///             .missing_strategy(MissingValueStrategy::ForwardFill)
///             .build()?,
///     )
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("{} rows kept", result.summary.rows_after);
/// ```
pub struct Pipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Pipeline can be moved to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Load the configured input file and clean it.
    pub fn run(&self) -> Result<CleaningResult> {
        let outcome = self.load().and_then(|df| {
            self.process_internal(df, Some(self.config.input_path.clone()))
        });
        self.finish(outcome)
    }

    /// Clean an already-loaded table.
    pub fn process(&self, df: DataFrame) -> Result<CleaningResult> {
        let outcome = self.process_internal(df, None);
        self.finish(outcome)
    }

    fn finish(&self, outcome: Result<CleaningResult>) -> Result<CleaningResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn load(&self) -> Result<DataFrame> {
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Loading,
            0.0,
            format!("Loading {}", self.config.input_path.display()),
        ));
        let df = load_prices(&self.config.input_path)?;
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Loading,
            1.0,
            format!("Loaded {} rows", df.height()),
        ));
        Ok(df)
    }

    fn process_internal(
        &self,
        df: DataFrame,
        input_path: Option<PathBuf>,
    ) -> Result<CleaningResult> {
        let start_time = Instant::now();
        let rows_before = df.height();
        let columns_before = df.width();
        let mut warnings = Vec::new();

        info!("Starting cleaning pipeline on {} rows", rows_before);

        // Step 1: Missing values
        self.report_progress(ProgressUpdate::new(
            CleaningStage::MissingValues,
            0.0,
            format!(
                "Handling missing values ({})",
                self.config.missing_strategy
            ),
        ));
        let (df, missing_values) =
            MissingValueHandler::handle(&df, self.config.missing_strategy)?;

        // Step 2: Outliers, once for the working table and once more for the
        // comparison view
        self.report_progress(ProgressUpdate::new(
            CleaningStage::OutlierRemoval,
            0.0,
            "Removing outliers...",
        ));
        let outlier_columns = numeric_column_names(&df, &self.config.excluded_columns);
        let (df, outliers) =
            OutlierFilter::remove_outliers(&df, &outlier_columns, self.config.z_threshold)?;
        for (i, bounds) in outliers.bounds.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_sub_stage(
                CleaningStage::OutlierRemoval,
                format!("Column: {}", bounds.column),
                0.5 * (i + 1) as f32 / outliers.bounds.len() as f32,
                format!(
                    "{} values outside [{:.4}, {:.4}]",
                    bounds.flagged, bounds.lower, bounds.upper
                ),
            ));
        }

        self.report_progress(ProgressUpdate::new(
            CleaningStage::OutlierRemoval,
            0.5,
            "Building comparison view...",
        ));
        let (comparison, comparison_outliers) =
            OutlierFilter::remove_outliers(&df, &outlier_columns, self.config.z_threshold)?;
        if comparison_outliers.rows_removed > 0 {
            warnings.push(format!(
                "A second outlier pass would remove {} more rows",
                comparison_outliers.rows_removed
            ));
        }

        // Step 3: Calendar fields
        self.report_progress(ProgressUpdate::new(
            CleaningStage::DateDerivation,
            0.0,
            "Deriving Year, Month, Day...",
        ));
        let df = DateFieldDeriver::derive(&df)?;
        let describe_before = describe(&df)?;

        // Step 4: Normalization
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Normalization,
            0.0,
            "Normalizing numeric columns...",
        ));
        let scale_columns = numeric_column_names(&df, &self.config.excluded_columns);
        let (mut df, normalization) =
            Normalizer::normalize(&df, &scale_columns, self.config.zero_variance_policy)?;
        for (i, stats) in normalization.scaled.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_sub_stage(
                CleaningStage::Normalization,
                format!("Column: {}", stats.column),
                (i + 1) as f32 / normalization.scaled.len() as f32,
                format!("Scaled with mean {:.4}, std {:.4}", stats.mean, stats.std),
            ));
        }
        for column in &normalization.skipped {
            warnings.push(format!("Column '{}' was left unscaled", column));
        }
        let describe_after = describe(&df)?;

        // Step 5: Persist
        let output_path = if self.config.save_to_disk {
            self.report_progress(ProgressUpdate::new(
                CleaningStage::Persisting,
                0.0,
                format!("Saving {}", self.config.output_path.display()),
            ));
            Some(persist_dataset(&mut df, &self.config.output_path)?)
        } else {
            None
        };

        let summary = CleaningSummary {
            duration_ms: start_time.elapsed().as_millis() as u64,
            input_path,
            output_path,
            rows_before,
            rows_after: df.height(),
            columns_before,
            columns_after: df.width(),
            missing_values,
            outliers,
            comparison_outliers,
            describe_before,
            describe_after,
            normalization,
            warnings,
        };

        if let Some(report_path) = &self.config.report_path {
            let generator = ReportGenerator::new(report_path.clone());
            generator.write_report_to_file(&ReportGenerator::build(JobKind::Clean, &summary))?;
        }

        info!(
            "Cleaning complete: {} -> {} rows in {} ms",
            summary.rows_before, summary.rows_after, summary.duration_ms
        );

        Ok(CleaningResult {
            data: df,
            comparison,
            summary,
        })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure to receive progress updates.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, crate::config::ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
