//! Report generation module.
//!
//! Every job result is wrapped in a [`Report`] envelope that is used for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--report` CLI flag or `report_path` in a config)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use equity_prep::reporting::{JobKind, ReportGenerator};
//!
//! let report = ReportGenerator::build(JobKind::Clean, &result.summary);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! ReportGenerator::new("out/clean_report.json".into()).write_report_to_file(&report)?;
//! ```

mod generator;

pub use generator::{JobKind, Report, ReportGenerator};
