//! Exploratory analysis of a daily price series.
//!
//! - Derived columns (returns, ranges, moving averages, day offsets)
//! - Linear trend and total growth
//! - Augmented Dickey-Fuller stationarity test
//! - Volume outliers (IQR fences), seasonality, yearly returns

mod exploratory;
pub mod stationarity;
pub mod trend;

pub use exploratory::{
    DatedValue, ExploratoryAnalysis, ExploratoryAnalyzer, ExploratoryReport, MonthlyMean,
    MovingAverages, Seasonality, StationarityReport, VolatilitySummary, VolumeOutliers,
    VolumeSummary, YearlyReturn,
};
pub use stationarity::{AdfResult, CriticalValues, adf_test};
pub use trend::LinearTrend;
