//! Per-file quality reports over a data directory.

use crate::error::{DataverseError, Result};
use crate::quality::{MissingValueDetector, OutlierDetector};
use crate::types::{FileAnalysis, FileReport};
use crate::utils::{DEFAULT_INFER_SCHEMA_LENGTH, list_source_csv_files, read_csv};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Builds per-file data quality reports.
#[derive(Debug, Clone, Copy)]
pub struct FileAnalyzer {
    infer_schema_length: Option<usize>,
}

impl Default for FileAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_INFER_SCHEMA_LENGTH)
    }
}

impl FileAnalyzer {
    /// `None` infers column types from every row.
    pub fn new(infer_schema_length: Option<usize>) -> Self {
        Self {
            infer_schema_length: infer_schema_length.map(|rows| rows.max(1)),
        }
    }

    /// Analyze one CSV file.
    ///
    /// Never fails: a file that cannot be read or analyzed yields
    /// [`FileAnalysis::Failed`] carrying the error text.
    pub fn analyze_file(&self, path: &Path) -> FileAnalysis {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let result = read_csv(path, self.infer_schema_length)
            .and_then(|df| Self::analyze_table(&file_name, &df));

        match result {
            Ok(report) => {
                debug!(
                    "Analyzed {}: {} rows, {} columns, {} outlier columns, {} suspicious columns",
                    file_name,
                    report.row_count,
                    report.column_count,
                    report.outliers.len(),
                    report.suspicious_values.len()
                );
                FileAnalysis::Analyzed(report)
            }
            Err(e) => {
                warn!("Failed to analyze {}: {}", file_name, e);
                FileAnalysis::Failed {
                    file_name,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Build the report of an in-memory table.
    pub fn analyze_table(file_name: &str, df: &DataFrame) -> Result<FileReport> {
        Ok(FileReport {
            file_name: file_name.to_string(),
            row_count: df.height(),
            column_count: df.width(),
            columns: df
                .get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect(),
            missing_data: MissingValueDetector::missing_counts(df),
            outliers: OutlierDetector::detect(df)?,
            suspicious_values: MissingValueDetector::suspicious_values(df)?,
        })
    }

    /// Analyze every CSV file of a directory, ordered by file name.
    ///
    /// The merged artifact is skipped. An empty directory yields an empty
    /// list; a missing one is an error.
    pub fn analyze_folder(&self, dir: &Path) -> Result<Vec<FileAnalysis>> {
        if !dir.is_dir() {
            return Err(DataverseError::FileNotFound(dir.display().to_string()));
        }

        let files = list_source_csv_files(dir)?;
        info!("Analyzing {} CSV files in {}", files.len(), dir.display());

        Ok(files
            .iter()
            .map(|name| self.analyze_file(&dir.join(name)))
            .collect())
    }
}
