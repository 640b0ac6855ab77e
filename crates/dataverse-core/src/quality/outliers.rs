//! Outlier detection.
//!
//! Numeric columns use the IQR fences; textual columns that parse as dates
//! are checked against a plausible calendar range. The multiplier and the
//! date bounds are fixed.

use crate::error::Result;
use crate::profiler::{classify_column, parse_dates};
use crate::types::{ColumnKind, ColumnOutliers};
use crate::utils::{numeric_values, string_values};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Multiplier applied to the interquartile range to place the fences.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Earliest plausible date; anything strictly before is an outlier.
static MIN_PLAUSIBLE_DATE: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid date: lower bound")
});

/// Latest plausible date; anything strictly after is an outlier.
static MAX_PLAUSIBLE_DATE: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(2100, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid date: upper bound")
});

/// Quantile of ascending-sorted values, interpolating linearly between the
/// two closest ranks.
///
/// Returns `None` for an empty slice.
pub fn quantile_linear(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Lower and upper IQR fences of a set of values.
///
/// NaN values are ignored. Returns `None` when no finite-comparable value remains.
pub fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile_linear(&sorted, 0.25)?;
    let q3 = quantile_linear(&sorted, 0.75)?;
    let iqr = q3 - q1;

    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
}

/// Detects numeric and date outliers.
pub struct OutlierDetector;

impl OutlierDetector {
    /// Detect outliers in every column of a table.
    ///
    /// Only columns with at least one finding appear in the result.
    pub fn detect(df: &DataFrame) -> Result<BTreeMap<String, ColumnOutliers>> {
        let mut outliers = BTreeMap::new();

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();

            let finding = match classify_column(series) {
                ColumnKind::Numeric => {
                    let values = numeric_values(series)?;
                    let found = Self::numeric_outliers(&values);
                    (!found.is_empty()).then_some(ColumnOutliers::Numeric(found))
                }
                ColumnKind::Textual => {
                    let values = string_values(series)?;
                    Self::date_outliers(&values)
                        .filter(|found| !found.is_empty())
                        .map(ColumnOutliers::Dates)
                }
            };

            if let Some(finding) = finding {
                debug!("Column '{}': {} outliers", name, finding.len());
                outliers.insert(name, finding);
            }
        }

        Ok(outliers)
    }

    /// Values strictly outside the IQR fences, in original order with duplicates.
    pub fn numeric_outliers(values: &[Option<f64>]) -> Vec<f64> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        let Some((lower, upper)) = iqr_bounds(&present) else {
            return Vec::new();
        };

        present
            .into_iter()
            .filter(|&v| v < lower || v > upper)
            .collect()
    }

    /// Out-of-range dates of a textual column, formatted `YYYY-MM-DD`.
    ///
    /// Returns `None` when no value parses as a date, meaning the column is
    /// not a date column at all.
    pub fn date_outliers(values: &[Option<String>]) -> Option<Vec<String>> {
        let parsed = parse_dates(values);
        if parsed.iter().all(Option::is_none) {
            return None;
        }

        let min = *MIN_PLAUSIBLE_DATE;
        let max = *MAX_PLAUSIBLE_DATE;

        Some(
            parsed
                .into_iter()
                .flatten()
                .filter(|dt| *dt < min || *dt > max)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn strings(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    // ==================== quantile tests ====================

    #[test]
    fn test_quantile_linear_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        // position = 3 * 0.25 = 0.75 -> 1 + 0.75 * (2 - 1)
        assert_eq!(quantile_linear(&sorted, 0.25), Some(1.75));
        // position = 3 * 0.75 = 2.25 -> 3 + 0.25 * (4 - 3)
        assert_eq!(quantile_linear(&sorted, 0.75), Some(3.25));
        assert_eq!(quantile_linear(&sorted, 0.5), Some(2.5));
    }

    #[test]
    fn test_quantile_edge_cases() {
        assert_eq!(quantile_linear(&[], 0.25), None);
        assert_eq!(quantile_linear(&[7.0], 0.75), Some(7.0));
    }

    #[test]
    fn test_iqr_bounds() {
        // Q1 = 3.25, Q3 = 7.75, IQR = 4.5
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let (lower, upper) = iqr_bounds(&values).unwrap();
        assert_eq!(lower, 3.25 - 1.5 * 4.5);
        assert_eq!(upper, 7.75 + 1.5 * 4.5);
    }

    // ==================== numeric outlier tests ====================

    #[test]
    fn test_numeric_outliers_basic() {
        let values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]);
        assert_eq!(OutlierDetector::numeric_outliers(&values), vec![100.0]);
    }

    #[test]
    fn test_numeric_outliers_keep_order_and_duplicates() {
        let values = some(&[
            -500.0, 10.0, 11.0, 12.0, 9999.0, 13.0, 12.0, 11.0, 10.0, -500.0,
        ]);
        assert_eq!(
            OutlierDetector::numeric_outliers(&values),
            vec![-500.0, 9999.0, -500.0]
        );
    }

    #[test]
    fn test_numeric_outliers_ignore_nulls() {
        let values = vec![Some(1.0), None, Some(2.0), Some(3.0), None, Some(2.0)];
        assert!(OutlierDetector::numeric_outliers(&values).is_empty());
    }

    #[test]
    fn test_numeric_outliers_boundary_is_not_outlier() {
        // Q1 = 2, Q3 = 4, IQR = 2, fences = [-1, 7]; 7 sits exactly on the fence
        let values = some(&[1.0, 2.0, 3.0, 4.0, 7.0]);
        assert!(OutlierDetector::numeric_outliers(&values).is_empty());
    }

    #[test]
    fn test_numeric_outliers_constant_column() {
        let values = some(&[5.0, 5.0, 5.0, 5.0]);
        assert!(OutlierDetector::numeric_outliers(&values).is_empty());
    }

    #[test]
    fn test_numeric_outliers_all_null() {
        let values: Vec<Option<f64>> = vec![None, None];
        assert!(OutlierDetector::numeric_outliers(&values).is_empty());
    }

    // ==================== date outlier tests ====================

    #[test]
    fn test_date_outliers_out_of_range() {
        let values = strings(&["2024-01-15", "1850-03-02", "2150-07-04", "2023-12-01"]);
        assert_eq!(
            OutlierDetector::date_outliers(&values),
            Some(vec!["1850-03-02".to_string(), "2150-07-04".to_string()])
        );
    }

    #[test]
    fn test_date_outliers_bounds_are_exclusive() {
        let values = strings(&["1900-01-01", "2100-01-01", "1899-12-31", "2100-01-02"]);
        assert_eq!(
            OutlierDetector::date_outliers(&values),
            Some(vec!["1899-12-31".to_string(), "2100-01-02".to_string()])
        );
    }

    #[test]
    fn test_date_outliers_mixed_formats() {
        let values = strings(&["01/15/1800", "15-01-2024", "garbage"]);
        assert_eq!(
            OutlierDetector::date_outliers(&values),
            Some(vec!["1800-01-15".to_string()])
        );
    }

    #[test]
    fn test_date_outliers_short_years_are_not_outliers() {
        let values = strings(&["2024-01-15", "3/4/24", "7/8/24", "24-01-15"]);
        assert_eq!(OutlierDetector::date_outliers(&values), Some(vec![]));
    }

    #[test]
    fn test_date_outliers_garbage_column_contributes_nothing() {
        let values = strings(&["Taylr Swft", "aaaaaaaa", "XX", "Unknown"]);
        assert_eq!(OutlierDetector::date_outliers(&values), None);
    }

    #[test]
    fn test_date_outliers_valid_dates_in_range() {
        let values = strings(&["2024-01-15", "2024-02-20"]);
        assert_eq!(OutlierDetector::date_outliers(&values), Some(vec![]));
    }

    // ==================== detect tests ====================

    #[test]
    fn test_detect_routes_columns() {
        let df = df![
            "amount" => [10.0, 11.0, 12.0, 13.0, 12.0, 11.0, 10.0, 9999.0],
            "order_date" => [
                "2024-01-01", "2024-01-02", "2099-12-31", "1850-01-01",
                "2024-01-05", "2024-01-06", "2024-01-07", "2024-01-08",
            ],
            "genre" => ["Pop", "Rock", "Unknown", "XX", "Pop", "Jazz", "Rock", "Pop"],
        ]
        .unwrap();

        let outliers = OutlierDetector::detect(&df).unwrap();

        assert_eq!(
            outliers.get("amount"),
            Some(&ColumnOutliers::Numeric(vec![9999.0]))
        );
        assert_eq!(
            outliers.get("order_date"),
            Some(&ColumnOutliers::Dates(vec!["1850-01-01".to_string()]))
        );
        assert!(!outliers.contains_key("genre"));
    }

    #[test]
    fn test_detect_omits_clean_columns() {
        let df = df![
            "qty" => [1i64, 2, 3, 4, 5],
            "day" => ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
        ]
        .unwrap();

        assert!(OutlierDetector::detect(&df).unwrap().is_empty());
    }

    #[test]
    fn test_detect_numeric_column_never_takes_date_path() {
        // 18500101 would be a date if parsed as text; numeric columns skip date parsing
        let df = df![
            "code" => [18500101i64, 18500102, 18500103, 18500104],
        ]
        .unwrap();

        assert!(OutlierDetector::detect(&df).unwrap().is_empty());
    }
}
