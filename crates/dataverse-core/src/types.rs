//! Core data types shared across the DataVerse modules.
//!
//! All report types are read-only values: they are produced once by an
//! analyzer and handed to the caller, never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the reserved merged artifact inside the data directory.
pub const MERGED_FILE_NAME: &str = "__merged_all_data.csv";

/// Separator between the file-stem prefix and the original column name.
pub const PREFIX_SEPARATOR: &str = "__";

/// Missing-value counts for the columns of one merged file, keyed by the
/// original (unprefixed) column name.
pub type MissingCounts = BTreeMap<String, usize>;

/// Per-prefix missing-value report of a merged table.
pub type MissingByPrefix = BTreeMap<String, MissingCounts>;

/// How a column is routed through the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Integer or float column as inferred by the CSV reader.
    Numeric,
    /// Anything else; candidates for date and sentinel detection.
    Textual,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Textual => write!(f, "textual"),
        }
    }
}

/// Outliers found in one column.
///
/// Serialized untagged: numeric outliers become a list of numbers, date
/// outliers a list of `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnOutliers {
    /// Values outside the IQR fences, in original row order.
    Numeric(Vec<f64>),
    /// Dates outside the plausible range, formatted `YYYY-MM-DD`.
    Dates(Vec<String>),
}

impl ColumnOutliers {
    /// Number of flagged cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnOutliers::Numeric(values) => values.len(),
            ColumnOutliers::Dates(values) => values.len(),
        }
    }

    /// Whether no cell was flagged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Analysis of a CSV file that could be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    pub row_count: usize,
    pub column_count: usize,
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Null counts, only for columns with at least one null.
    pub missing_data: BTreeMap<String, usize>,
    /// Outliers, only for columns with findings.
    pub outliers: BTreeMap<String, ColumnOutliers>,
    /// Distinct sentinel values (`None` = null cell), only for columns with findings.
    pub suspicious_values: BTreeMap<String, Vec<Option<String>>>,
}

/// Outcome of analyzing a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileAnalysis {
    Analyzed(FileReport),
    Failed { file_name: String, error: String },
}

impl FileAnalysis {
    /// Name of the analyzed file.
    pub fn file_name(&self) -> &str {
        match self {
            FileAnalysis::Analyzed(report) => &report.file_name,
            FileAnalysis::Failed { file_name, .. } => file_name,
        }
    }

    /// The report, when the file could be analyzed.
    pub fn report(&self) -> Option<&FileReport> {
        match self {
            FileAnalysis::Analyzed(report) => Some(report),
            FileAnalysis::Failed { .. } => None,
        }
    }

    /// The error message, when the file could not be analyzed.
    pub fn error(&self) -> Option<&str> {
        match self {
            FileAnalysis::Analyzed(_) => None,
            FileAnalysis::Failed { error, .. } => Some(error),
        }
    }
}

/// Result of a file reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReductionOutcome {
    /// Files selected to stay, always ending with the merged artifact name.
    pub kept: Vec<String>,
    /// Files deleted (or already absent) from the data directory.
    pub removed: Vec<String>,
}

/// Status of one line of a batch modification file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    Success,
    Skipped,
    Warning,
}

/// Per-line outcome of a batch modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLineResult {
    /// 1-based index among the non-blank lines.
    pub line: usize,
    pub status: LineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub line_content: String,
}

/// Result of a single-file modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModificationOutcome {
    pub file_name: String,
    /// Explanation of the applied edit returned by the editor.
    pub output: String,
}

/// Answer to a natural-language question about the merged data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub output: String,
}

/// Output of a synthetic data generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedData {
    /// The SQL script as returned by the generator, fences stripped.
    pub sql: String,
    /// CSV files written from the script's INSERT statements.
    pub tables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_column_outliers_serialize_untagged() {
        let numeric = ColumnOutliers::Numeric(vec![100.0, -50.0]);
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!([100.0, -50.0]));

        let dates = ColumnOutliers::Dates(vec!["1850-01-01".to_string()]);
        assert_eq!(serde_json::to_value(&dates).unwrap(), json!(["1850-01-01"]));
    }

    #[test]
    fn test_failed_analysis_serializes_flat() {
        let failed = FileAnalysis::Failed {
            file_name: "broken.csv".to_string(),
            error: "bad header".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"file_name": "broken.csv", "error": "bad header"})
        );
        assert_eq!(failed.file_name(), "broken.csv");
        assert!(failed.report().is_none());
    }

    #[test]
    fn test_suspicious_null_serializes_as_json_null() {
        let mut suspicious = BTreeMap::new();
        suspicious.insert(
            "country".to_string(),
            vec![Some("XX".to_string()), None],
        );
        let report = FileReport {
            file_name: "customers.csv".to_string(),
            row_count: 3,
            column_count: 1,
            columns: vec!["country".to_string()],
            missing_data: BTreeMap::new(),
            outliers: BTreeMap::new(),
            suspicious_values: suspicious,
        };
        let value = serde_json::to_value(FileAnalysis::Analyzed(report)).unwrap();
        assert_eq!(value["suspicious_values"]["country"], json!(["XX", null]));
        assert_eq!(value["row_count"], json!(3));
    }

    #[test]
    fn test_line_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LineStatus::Skipped).unwrap(),
            "\"skipped\""
        );
    }

    #[test]
    fn test_column_kind_display() {
        assert_eq!(ColumnKind::Numeric.to_string(), "numeric");
        assert_eq!(ColumnKind::Textual.to_string(), "textual");
    }
}
