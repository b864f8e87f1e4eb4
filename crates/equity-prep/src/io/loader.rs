//! Loading delimited price files into a DataFrame.

use crate::error::{PrepError, Result, ResultExt};
use crate::utils::nan_to_null;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Columns every price file must provide.
pub const REQUIRED_PRICE_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Cell contents read as missing, in addition to an empty field.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a CSV file with a header row.
///
/// Fails with [`PrepError::NotFound`] when the file does not exist or cannot
/// be opened. Otherwise tries progressively more lenient read strategies
/// before giving up with the last parse error.
///
/// Any of [`MISSING_MARKERS`] and any floating-point NaN load as null, so a
/// marker never turns a numeric column into text.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();

    if !path.is_file() || File::open(path).is_err() {
        error!("Input file not found: {}", path.display());
        return Err(PrepError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut df = load_csv_with_fallbacks(path)
        .context(format!("Failed to read {}", path.display()))?;

    let converted = nan_to_null(&mut df)?;
    if converted > 0 {
        debug!("Converted {} NaN values to missing", converted);
    }

    info!("Dataset loaded from {}: {:?}", path.display(), df.shape());
    Ok(df)
}

/// Load a price file and check that the OHLCV columns are present.
pub fn load_prices(path: impl AsRef<Path>) -> Result<DataFrame> {
    let df = load_dataset(path)?;
    require_columns(&df, &REQUIRED_PRICE_COLUMNS)?;
    Ok(df)
}

/// Fail with `ColumnNotFound` for the first missing column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(PrepError::ColumnNotFound((*name).to_string()));
        }
    }
    Ok(())
}

/// Load CSV with multiple fallback strategies.
fn load_csv_with_fallbacks(path: &Path) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(parse_options().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(parse_options().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    let content = std::fs::read_to_string(path)?;
    let cursor = Cursor::new(clean_csv_content(&content));

    Ok(CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(parse_options())
        .into_reader_with_file_handle(cursor)
        .finish()?)
}

fn parse_options() -> CsvParseOptions {
    CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(
        MISSING_MARKERS.iter().map(|m| (*m).into()).collect(),
    )))
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::column_options;
    use std::io::Write;

    fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let result = load_dataset("definitely/not/here.csv");
        assert!(matches!(result, Err(PrepError::NotFound { .. })));
    }

    #[test]
    fn test_load_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset(dir.path());
        assert!(matches!(result, Err(PrepError::NotFound { .. })));
    }

    #[test]
    fn test_load_prices_basic() {
        let file = write_temp_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-02,10.0,11.0,9.5,10.5,1000\n\
             2020-01-03,10.5,12.0,10.0,11.5,1500\n",
        );

        let df = load_prices(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 6));
        assert_eq!(df.column("Close").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Date").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_load_prices_missing_column() {
        let file = write_temp_csv("Date,Open,Close\n2020-01-02,1.0,2.0\n");
        let result = load_prices(file.path());
        assert!(matches!(result, Err(PrepError::ColumnNotFound(ref c)) if c == "High"));
    }

    #[test]
    fn test_load_keeps_missing_values_as_nulls() {
        let file = write_temp_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-02,10.0,11.0,9.5,,1000\n\
             2020-01-03,10.5,12.0,10.0,11.5,\n",
        );

        let df = load_prices(file.path()).unwrap();
        assert_eq!(df.column("Close").unwrap().null_count(), 1);
        assert_eq!(df.column("Volume").unwrap().null_count(), 1);
    }

    #[test]
    fn test_load_reads_missing_markers_as_nulls() {
        let file = write_temp_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-02,10.0,11.0,9.5,NA,1000\n\
             2020-01-03,N/A,12.0,10.0,11.5,null\n\
             2020-01-06,10.8,12.2,10.1,11.9,1200\n",
        );

        let df = load_prices(file.path()).unwrap();
        assert_eq!(df.column("Close").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Close").unwrap().null_count(), 1);
        assert_eq!(df.column("Open").unwrap().null_count(), 1);
        assert_eq!(df.column("Volume").unwrap().null_count(), 1);
        assert!(df.column("Volume").unwrap().dtype().is_integer());
    }

    #[test]
    fn test_load_reads_nan_as_null() {
        let file = write_temp_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-02,10.0,11.0,9.5,NaN,1000\n\
             2020-01-03,10.5,12.0,10.0,nan,1500\n\
             2020-01-06,10.8,12.2,10.1,11.9,1200\n",
        );

        let df = load_prices(file.path()).unwrap();
        let close = column_options(&df, "Close").unwrap();
        assert_eq!(close, vec![None, None, Some(11.9)]);
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = clean_csv_content("a,b\n\n\"\"x\"\",1\n");
        assert_eq!(cleaned, "a,b\n\"x\",1");
    }
}
