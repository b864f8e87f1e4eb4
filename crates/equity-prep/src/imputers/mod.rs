//! Imputation module for handling missing values.
//!
//! This module provides:
//! - Statistical imputation (column mean)
//! - Table-wide strategies: mean, drop, forward fill, backward fill

mod missing;
mod statistical;

pub use missing::{MissingValueHandler, MissingValueReport};
pub use statistical::StatisticalImputer;
