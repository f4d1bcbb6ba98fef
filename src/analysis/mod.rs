//! Analysis module
//!
//! Descriptive statistics over numeric dataset columns:
//! - Distribution shape (skew, quartiles, histogram, box-plot whiskers)
//! - Unusual services beyond the box-plot fences
//! - Text reports

pub mod distribution;
pub mod outliers;
pub mod report;

pub use distribution::{BinRule, Distribution, FiveNumberSummary, Histogram};
pub use outliers::{OutlierReport, find_outliers};
pub use report::render_distribution;
