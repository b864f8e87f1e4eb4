//! Shared utilities for the cleaning and analysis jobs.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of the numeric columns of `df`, in table order, minus `excluded`.
///
/// This is the "column selection set" used by the outlier filter and the
/// normalizer.
pub fn numeric_column_names(df: &DataFrame, excluded: &[String]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .filter(|name| !excluded.iter().any(|e| e == name))
        .collect()
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Values of a numeric Series as `f64`, keeping missing entries as `None`.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Non-missing values of a numeric column, as `f64`.
pub fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let col = df.column(name)?;
    Ok(series_to_f64(col.as_materialized_series())?
        .into_iter()
        .flatten()
        .collect())
}

/// Values of a numeric column, as `f64`, with missing entries as `None`.
pub fn column_options(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let col = df.column(name)?;
    series_to_f64(col.as_materialized_series())
}

/// Text values of a column; non-string columns are rendered with `cast`.
pub fn column_strings(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let col = df.column(name)?;
    let as_text = col.as_materialized_series().cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Missing Value Utilities
// =============================================================================

/// Missing value count for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCount {
    pub column: String,
    pub count: usize,
}

/// Count missing values per column, in table order.
pub fn null_counts(df: &DataFrame) -> Vec<ColumnCount> {
    df.get_columns()
        .iter()
        .map(|col| ColumnCount {
            column: col.name().to_string(),
            count: col.null_count(),
        })
        .collect()
}

/// Total number of missing cells in the table.
pub fn total_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

/// Replace floating-point NaN with null in every float column.
///
/// Returns the number of values converted.
pub fn nan_to_null(df: &mut DataFrame) -> PolarsResult<usize> {
    let mut converted = 0;
    let float_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_float())
        .map(|col| col.name().to_string())
        .collect();

    for name in float_columns {
        let values = column_options(df, &name)?;
        let nan_count = values.iter().flatten().filter(|v| v.is_nan()).count();
        if nan_count == 0 {
            continue;
        }
        let cleaned: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        df.replace(&name, Series::new(name.as_str().into(), cleaned))?;
        converted += nan_count;
    }
    Ok(converted)
}

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<Option<f64>> = series_to_f64(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_nan_to_null() {
        let mut df = df![
            "Close" => [Some(1.0), Some(f64::NAN), None],
            "Volume" => [1i64, 2, 3],
        ]
        .unwrap();

        assert_eq!(nan_to_null(&mut df).unwrap(), 1);
        assert_eq!(
            column_options(&df, "Close").unwrap(),
            vec![Some(1.0), None, None]
        );
        assert_eq!(df.column("Volume").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_numeric_column_names_excludes_temporal() {
        let df = df![
            "Date" => ["2020-01-01", "2020-01-02"],
            "Close" => [1.0, 2.0],
            "Volume" => [10i64, 20],
            "Year" => [2020i32, 2020],
        ]
        .unwrap();

        let excluded = vec!["Year".to_string()];
        assert_eq!(numeric_column_names(&df, &excluded), vec!["Close", "Volume"]);
    }

    #[test]
    fn test_null_counts() {
        let df = df![
            "a" => [Some(1.0), None, None],
            "b" => [Some("x"), Some("y"), None],
        ]
        .unwrap();

        let counts = null_counts(&df);
        assert_eq!(counts[0], ColumnCount { column: "a".to_string(), count: 2 });
        assert_eq!(counts[1], ColumnCount { column: "b".to_string(), count: 1 });
        assert_eq!(total_nulls(&df), 3);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_series_to_f64_from_integers() {
        let series = Series::new("v".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(series_to_f64(&series).unwrap(), vec![Some(1.0), None, Some(3.0)]);
    }
}
