//! Calendar field derivation from the `Date` column.

use crate::error::{PrepError, Result};
use crate::utils::column_strings;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, error, info};

/// Name of the date column in every price file.
pub const DATE_COLUMN: &str = "Date";

/// Canonical output format of the Date column.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a date in any of the accepted text formats.
///
/// Time-of-day components are discarded.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse every value of a date column, failing on the first bad entry.
///
/// `Date` and `Datetime` columns are rendered to text first, so all dtypes
/// go through the same parser.
pub fn parse_date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    if df.column(name).is_err() {
        return Err(PrepError::ColumnNotFound(name.to_string()));
    }

    column_strings(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value.as_deref().and_then(parse_date) {
            Some(date) => Ok(date),
            None => {
                let value = value.unwrap_or_default();
                error!("Unparseable date at row {}: '{}'", row, value);
                Err(PrepError::ParseError { row, value })
            }
        })
        .collect()
}

/// Adds Year / Month / Day columns derived from the `Date` column.
pub struct DateFieldDeriver;

impl DateFieldDeriver {
    /// Rewrite `Date` as `%Y-%m-%d` text and append Int32 `Year`, `Month`
    /// and `Day` columns (replacing them if already present).
    ///
    /// Any missing or unparseable date fails the whole call.
    pub fn derive(df: &DataFrame) -> Result<DataFrame> {
        let dates = parse_date_column(df, DATE_COLUMN)?;

        let canonical: Vec<String> = dates
            .iter()
            .map(|d| d.format(CANONICAL_DATE_FORMAT).to_string())
            .collect();
        let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
        let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();
        let days: Vec<i32> = dates.iter().map(|d| d.day() as i32).collect();

        let mut result = df.clone();
        result.replace(DATE_COLUMN, Series::new(DATE_COLUMN.into(), canonical))?;
        result.with_column(Series::new("Year".into(), years))?;
        result.with_column(Series::new("Month".into(), months))?;
        result.with_column(Series::new("Day".into(), days))?;

        if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
            debug!("Date range: {} to {}", first, last);
        }
        info!("Derived Year, Month, Day for {} rows", dates.len());

        Ok(result)
    }
}
