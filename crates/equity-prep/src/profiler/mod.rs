//! Data profiling module.
//!
//! This module provides the statistics shared by every stage:
//! - Mean / standard deviation with explicit degrees of freedom
//! - Linear-interpolated quantiles
//! - Pearson correlation
//! - Per-column descriptive summaries (`describe`)

mod statistics;

pub use statistics::{
    ColumnDescription, ColumnStats, describe, mean, pearson, quantile_sorted, std_dev,
};
