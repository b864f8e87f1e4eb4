//! Missing value resolution for a whole table.

use super::StatisticalImputer;
use crate::config::MissingValueStrategy;
use crate::error::Result;
use crate::utils::{ColumnCount, is_numeric_dtype, null_counts, total_nulls};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Missing value counts before and after a strategy was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueReport {
    pub strategy: MissingValueStrategy,
    pub before: Vec<ColumnCount>,
    pub after: Vec<ColumnCount>,
    pub rows_removed: usize,
}

impl MissingValueReport {
    /// Total missing cells before the strategy ran.
    pub fn total_before(&self) -> usize {
        self.before.iter().map(|c| c.count).sum()
    }

    /// Total missing cells left afterwards.
    pub fn total_after(&self) -> usize {
        self.after.iter().map(|c| c.count).sum()
    }
}

/// Applies a [`MissingValueStrategy`] to every column of a table.
pub struct MissingValueHandler;

impl MissingValueHandler {
    /// Resolve missing values and report the counts before and after.
    pub fn handle(
        df: &DataFrame,
        strategy: MissingValueStrategy,
    ) -> Result<(DataFrame, MissingValueReport)> {
        let before = null_counts(df);
        info!(
            "Handling {} missing values with strategy '{}'",
            total_nulls(df),
            strategy
        );
        for count in before.iter().filter(|c| c.count > 0) {
            debug!("  {}: {} missing", count.column, count.count);
        }

        let result = match strategy {
            MissingValueStrategy::Mean => Self::fill_means(df)?,
            MissingValueStrategy::Drop => Self::drop_incomplete_rows(df)?,
            MissingValueStrategy::ForwardFill => {
                Self::fill_directional(df, FillNullStrategy::Forward(None))?
            }
            MissingValueStrategy::BackwardFill => {
                Self::fill_directional(df, FillNullStrategy::Backward(None))?
            }
        };

        let report = MissingValueReport {
            strategy,
            before,
            after: null_counts(&result),
            rows_removed: df.height() - result.height(),
        };

        info!(
            "Missing values: {} before, {} after, {} rows removed",
            report.total_before(),
            report.total_after(),
            report.rows_removed
        );

        Ok((result, report))
    }

    fn fill_means(df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        let numeric: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect();

        for name in numeric {
            StatisticalImputer::apply_numeric_mean(&mut result, &name)?;
        }
        Ok(result)
    }

    fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
        Ok(df.drop_nulls::<String>(None)?)
    }

    fn fill_directional(df: &DataFrame, strategy: FillNullStrategy) -> Result<DataFrame> {
        let mut result = df.clone();
        for col in df.get_columns() {
            if col.null_count() == 0 {
                continue;
            }
            let filled = col.as_materialized_series().fill_null(strategy)?;
            result.replace(col.name().as_str(), filled)?;
        }
        Ok(result)
    }
}
