//! Missing and suspicious value detection.

use crate::error::Result;
use crate::profiler::classify_column;
use crate::types::ColumnKind;
use crate::utils::string_values;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Placeholder tokens that stand in for a missing value. Matching is exact
/// and case-sensitive.
pub const SENTINEL_TOKENS: [&str; 5] = ["Unknown", "unknown", "XX", "NULL", "null"];

/// Whether a non-null cell holds one of the [`SENTINEL_TOKENS`].
#[inline]
pub fn is_sentinel(value: &str) -> bool {
    SENTINEL_TOKENS.contains(&value)
}

/// Whether a textual cell is suspicious: null, or a sentinel token.
#[inline]
pub fn is_suspicious(cell: Option<&str>) -> bool {
    cell.is_none_or(is_sentinel)
}

/// Detects nulls and placeholder values.
pub struct MissingValueDetector;

impl MissingValueDetector {
    /// Null count per column, only for columns with at least one null.
    pub fn missing_counts(df: &DataFrame) -> BTreeMap<String, usize> {
        df.get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect()
    }

    /// Distinct suspicious values per textual column, in first-seen order.
    ///
    /// A null cell is reported as `None`. Numeric columns are never inspected.
    pub fn suspicious_values(df: &DataFrame) -> Result<BTreeMap<String, Vec<Option<String>>>> {
        let mut suspicious = BTreeMap::new();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            if classify_column(series) != ColumnKind::Textual {
                continue;
            }

            let found = Self::distinct_suspicious(&string_values(series)?);
            if !found.is_empty() {
                suspicious.insert(series.name().to_string(), found);
            }
        }

        Ok(suspicious)
    }

    /// Deduplicated suspicious cells of a single column, in first-seen order.
    pub fn distinct_suspicious(values: &[Option<String>]) -> Vec<Option<String>> {
        let mut found: Vec<Option<String>> = Vec::new();
        for value in values {
            if is_suspicious(value.as_deref()) && !found.contains(value) {
                found.push(value.clone());
            }
        }
        found
    }
}
