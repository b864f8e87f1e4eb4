//! Configuration types for the cleaning, exploratory and accuracy jobs.
//!
//! This module provides configuration options using the builder pattern.
//! Defaults are the fixed relative paths and constants the jobs have always
//! used, so an unconfigured run behaves the same way.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default input dataset, relative to the working directory.
pub const DEFAULT_INPUT_PATH: &str = "../../database/uber_stock_data.csv";

/// Default cleaned dataset written by the cleaning pipeline.
pub const DEFAULT_OUTPUT_PATH: &str = "dados_tratados.csv";

/// Default z-score threshold for outlier removal.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Derived temporal columns that are never filtered or standardized.
pub const TEMPORAL_COLUMNS: [&str; 3] = ["Year", "Month", "Day"];

/// Strategy for resolving missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Replace missing numeric entries with the column mean
    #[default]
    Mean,
    /// Drop every record that has a missing value in any column
    Drop,
    /// Carry the nearest preceding non-missing value forward
    ForwardFill,
    /// Carry the nearest following non-missing value backward
    BackwardFill,
}

impl MissingValueStrategy {
    /// Returns the canonical snake_case name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Drop => "drop",
            Self::ForwardFill => "forward_fill",
            Self::BackwardFill => "backward_fill",
        }
    }
}

impl std::fmt::Display for MissingValueStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the normalizer does with a zero-variance column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Abort the run with `PrepError::DegenerateColumn`
    #[default]
    Fail,
    /// Leave the column unchanged and log a warning
    Skip,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use equity_prep::config::{CleaningConfig, MissingValueStrategy};
///
/// let config = CleaningConfig::builder()
///     .input_path("data/prices.csv")
///     .missing_strategy(MissingValueStrategy::ForwardFill)
///     .z_threshold(3.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Path of the raw price file.
    pub input_path: PathBuf,

    /// Path of the cleaned CSV written by the persister.
    pub output_path: PathBuf,

    /// Strategy for resolving missing values.
    /// Default: Mean
    pub missing_strategy: MissingValueStrategy,

    /// Number of standard deviations beyond which a value is an outlier.
    /// Default: 3.0
    pub z_threshold: f64,

    /// Numeric columns excluded from outlier filtering and normalization.
    /// Default: Year, Month, Day
    pub excluded_columns: Vec<String>,

    /// Behavior for zero-variance columns during normalization.
    /// Default: Fail
    pub zero_variance_policy: ZeroVariancePolicy,

    /// Optional path for a JSON summary of the run.
    pub report_path: Option<PathBuf>,

    /// Whether to write the cleaned table to `output_path`.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            missing_strategy: MissingValueStrategy::default(),
            z_threshold: DEFAULT_Z_THRESHOLD,
            excluded_columns: default_excluded_columns(),
            zero_variance_policy: ZeroVariancePolicy::default(),
            report_path: None,
            save_to_disk: true,
        }
    }
}

fn default_excluded_columns() -> Vec<String> {
    TEMPORAL_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.z_threshold.is_finite() || self.z_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "z_threshold".to_string(),
                value: self.z_threshold,
            });
        }

        if self.save_to_disk && self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("output_path".to_string()));
        }

        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("input_path".to_string()));
        }

        Ok(())
    }

    /// Whether a column belongs to the excluded (temporal) set.
    pub fn is_excluded(&self, column: &str) -> bool {
        self.excluded_columns.iter().any(|c| c == column)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be a positive finite number)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Path for '{0}' must not be empty")]
    EmptyPath(String),
}

impl From<ConfigValidationError> for crate::error::PrepError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::PrepError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    missing_strategy: Option<MissingValueStrategy>,
    z_threshold: Option<f64>,
    excluded_columns: Option<Vec<String>>,
    zero_variance_policy: Option<ZeroVariancePolicy>,
    report_path: Option<PathBuf>,
    save_to_disk: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Set the raw input file.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the cleaned output file.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the missing value strategy.
    pub fn missing_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_strategy = Some(strategy);
        self
    }

    /// Set the z-score threshold for outlier removal.
    ///
    /// # Arguments
    /// * `threshold` - Positive number of standard deviations (e.g., 3.0)
    pub fn z_threshold(mut self, threshold: f64) -> Self {
        self.z_threshold = Some(threshold);
        self
    }

    /// Replace the set of columns excluded from filtering and normalization.
    pub fn excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the zero-variance policy for the normalizer.
    pub fn zero_variance_policy(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance_policy = Some(policy);
        self
    }

    /// Write a JSON summary of the run to this path.
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Enable or disable writing the cleaned table.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            input_path: self
                .input_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            missing_strategy: self.missing_strategy.unwrap_or_default(),
            z_threshold: self.z_threshold.unwrap_or(DEFAULT_Z_THRESHOLD),
            excluded_columns: self
                .excluded_columns
                .unwrap_or_else(default_excluded_columns),
            zero_variance_policy: self.zero_variance_policy.unwrap_or_default(),
            report_path: self.report_path,
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Default ground-truth file consumed by the accuracy job.
pub const DEFAULT_ACTUAL_PATH: &str = "dados_tratados_sem_normalizacao.csv";

/// Default forecast file consumed by the accuracy job.
pub const DEFAULT_PREDICTED_PATH: &str = "previsao_uber.csv";

/// Configuration for forecast accuracy scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyConfig {
    pub actual_path: PathBuf,
    pub predicted_path: PathBuf,
    /// Price column in the actual file. Default: "Close"
    pub actual_column: String,
    /// Price column in the predicted file. Default: "Close Previsto"
    pub predicted_column: String,
    pub report_path: Option<PathBuf>,
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self {
            actual_path: PathBuf::from(DEFAULT_ACTUAL_PATH),
            predicted_path: PathBuf::from(DEFAULT_PREDICTED_PATH),
            actual_column: "Close".to_string(),
            predicted_column: "Close Previsto".to_string(),
            report_path: None,
        }
    }
}

/// Configuration for the exploratory analysis job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    pub input_path: PathBuf,
    /// Short moving-average window. Default: 50
    pub short_window: usize,
    /// Long moving-average window. Default: 200
    pub long_window: usize,
    /// Lag order for the ADF test. `None` uses the Schwert rule.
    pub adf_lags: Option<usize>,
    pub report_path: Option<PathBuf>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            short_window: 50,
            long_window: 200,
            adf_lags: None,
            report_path: None,
        }
    }
}

impl ExploreConfig {
    /// Validate window sizes.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.short_window == 0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "short_window".to_string(),
                value: 0.0,
            });
        }
        if self.long_window == 0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "long_window".to_string(),
                value: 0.0,
            });
        }
        Ok(())
    }
}
