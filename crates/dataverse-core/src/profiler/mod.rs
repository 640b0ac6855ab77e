//! Column profiling for the quality detectors.
//!
//! This module provides the two leaf components every detector relies on:
//! - [`classify_column`]: routes a column to the numeric or the textual path
//! - [`parse_dates`]: best-effort parsing of heterogeneous date strings

mod classifier;
mod dates;

pub use classifier::{classify_column, classify_dtype};
pub use dates::{parse_date, parse_dates};
