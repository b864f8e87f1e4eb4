//! File input and output.
//!
//! - [`load_dataset`] / [`load_prices`]: CSV in, with `NotFound` on a missing file
//! - [`persist_dataset`]: CSV out, refusing to write an empty table
//! - [`write_json_report`]: pretty JSON for run summaries

mod loader;
mod persister;

pub use loader::{REQUIRED_PRICE_COLUMNS, load_dataset, load_prices, require_columns};
pub use persister::{persist_dataset, write_json_report};
