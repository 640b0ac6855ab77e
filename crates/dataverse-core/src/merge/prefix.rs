//! Missing-value counts of the merged table, grouped by source file prefix.

use crate::error::Result;
use crate::types::{MissingByPrefix, PREFIX_SEPARATOR};
use crate::utils::read_csv;
use polars::prelude::*;
use std::path::Path;

/// Missing-value counts of a merged table, grouped by file prefix.
///
/// Columns without the prefix separator are ignored. Only columns with at
/// least one null appear, and only prefixes with at least one such column.
pub fn missing_by_prefix(df: &DataFrame) -> MissingByPrefix {
    let mut report = MissingByPrefix::new();

    for column in df.get_columns() {
        let missing = column.null_count();
        if missing == 0 {
            continue;
        }

        if let Some((prefix, original)) = column.name().split_once(PREFIX_SEPARATOR) {
            report
                .entry(prefix.to_string())
                .or_default()
                .insert(original.to_string(), missing);
        }
    }

    report
}

/// Read a merged CSV from disk and report its missing values by prefix.
pub fn missing_by_prefix_from_file(
    path: &Path,
    infer_schema_length: Option<usize>,
) -> Result<MissingByPrefix> {
    let df = read_csv(path, infer_schema_length)?;
    Ok(missing_by_prefix(&df))
}
