//! Writing cleaned tables and JSON reports to disk.

use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Write a table as CSV with a header row and no index column.
///
/// An empty table fails with [`PrepError::EmptyResult`] before the output
/// file is touched, so an existing file at `path` is left as it was.
pub fn persist_dataset(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    if df.height() == 0 {
        error!("Refusing to write {}: dataset is empty", path.display());
        return Err(PrepError::EmptyResult(format!(
            "dataset is empty, {} was not written",
            path.display()
        )));
    }

    ensure_parent_dir(path)?;
    let mut file = File::create(path)?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .map_err(|e| {
            error!("Failed to write {}: {}", path.display(), e);
            PrepError::Polars(e)
        })?;

    info!("Cleaned dataset saved: {}", path.display());
    Ok(path.to_path_buf())
}

/// Write any serializable report as pretty JSON.
pub fn write_json_report<T: Serialize>(report: &T, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut file = File::create(path)?;
    file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

    info!("Report saved: {}", path.display());
    Ok(path.to_path_buf())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
