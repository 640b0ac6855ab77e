//! Configuration types for the DataVerse service.
//!
//! This module provides configuration options using the builder pattern.
//! The statistical thresholds of the detectors (IQR multiplier, date bounds)
//! are deliberately not part of the configuration; see
//! [`quality::outliers`](crate::quality::outliers).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory used when neither the caller nor the environment names one.
pub const DEFAULT_DATA_DIR: &str = "Industry-Sub_domain Data";

/// Environment variable that overrides [`DEFAULT_DATA_DIR`].
pub const DATA_DIR_ENV: &str = "DATAVERSE_DATA_DIR";

/// Configuration for a [`DataverseService`](crate::service::DataverseService).
///
/// # Example
///
/// ```rust,ignore
/// use dataverse_core::config::DataverseConfig;
///
/// let config = DataverseConfig::builder()
///     .data_dir("./data")
///     .summary_rows(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataverseConfig {
    /// Folder holding the generated CSV files and the merged artifact.
    /// Default: "Industry-Sub_domain Data"
    pub data_dir: PathBuf,

    /// Number of rows the CSV reader samples for schema inference;
    /// `None` scans the whole file.
    /// Default: None
    #[serde(default)]
    pub infer_schema_length: Option<usize>,

    /// Rows read per file when summarizing files for the reduction ranking.
    /// Default: 3
    pub summary_rows: usize,

    /// Rows of the merged table shown to the LLM when answering a question.
    /// Default: 20
    pub query_sample_rows: usize,

    /// Whether `shutdown` deletes the merged artifact.
    /// Default: true
    pub cleanup_on_shutdown: bool,
}

impl Default for DataverseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            infer_schema_length: None,
            summary_rows: 3,
            query_sample_rows: 20,
            cleanup_on_shutdown: true,
        }
    }
}

impl DataverseConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DataverseConfigBuilder {
        DataverseConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyDataDir);
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidRowCount {
                field: "infer_schema_length".to_string(),
                value: 0,
            });
        }

        if self.summary_rows == 0 {
            return Err(ConfigValidationError::InvalidRowCount {
                field: "summary_rows".to_string(),
                value: self.summary_rows,
            });
        }

        if self.query_sample_rows == 0 {
            return Err(ConfigValidationError::InvalidRowCount {
                field: "query_sample_rows".to_string(),
                value: self.query_sample_rows,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Data directory must not be empty")]
    EmptyDataDir,

    #[error("Invalid row count for '{field}': {value} (must be at least 1)")]
    InvalidRowCount { field: String, value: usize },
}

impl From<ConfigValidationError> for crate::error::DataverseError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::DataverseError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`DataverseConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DataverseConfigBuilder {
    data_dir: Option<PathBuf>,
    infer_schema_length: Option<usize>,
    summary_rows: Option<usize>,
    query_sample_rows: Option<usize>,
    cleanup_on_shutdown: Option<bool>,
}

impl DataverseConfigBuilder {
    /// Set the data directory.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Set how many rows the CSV reader inspects to infer column types.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set how many rows are read per file for reduction summaries.
    pub fn summary_rows(mut self, rows: usize) -> Self {
        self.summary_rows = Some(rows);
        self
    }

    /// Set how many merged rows are included in question prompts.
    pub fn query_sample_rows(mut self, rows: usize) -> Self {
        self.query_sample_rows = Some(rows);
        self
    }

    /// Enable or disable deleting the merged artifact on shutdown.
    pub fn cleanup_on_shutdown(mut self, cleanup: bool) -> Self {
        self.cleanup_on_shutdown = Some(cleanup);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DataverseConfig` or an error if validation fails.
    pub fn build(self) -> Result<DataverseConfig, ConfigValidationError> {
        let defaults = DataverseConfig::default();
        let config = DataverseConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            infer_schema_length: self.infer_schema_length.or(defaults.infer_schema_length),
            summary_rows: self.summary_rows.unwrap_or(defaults.summary_rows),
            query_sample_rows: self
                .query_sample_rows
                .unwrap_or(defaults.query_sample_rows),
            cleanup_on_shutdown: self
                .cleanup_on_shutdown
                .unwrap_or(defaults.cleanup_on_shutdown),
        };

        config.validate()?;
        Ok(config)
    }
}
