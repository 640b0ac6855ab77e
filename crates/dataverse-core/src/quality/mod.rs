//! Data quality analysis module.
//!
//! This module provides the per-file reports: null counts, numeric and date
//! outliers, and suspicious placeholder values.

mod analyzer;
mod missing;
pub mod outliers;

pub use analyzer::FileAnalyzer;
pub use missing::{MissingValueDetector, SENTINEL_TOKENS, is_sentinel, is_suspicious};
pub use outliers::{IQR_MULTIPLIER, OutlierDetector, iqr_bounds, quantile_linear};
