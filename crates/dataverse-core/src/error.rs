//! Custom error types for the DataVerse core library.
//!
//! This module provides the error hierarchy using `thiserror`. Per-file
//! failures during folder analysis are *not* errors: they are recorded as
//! data on the affected [`FileAnalysis`](crate::types::FileAnalysis). The
//! variants here cover whole-operation failures only.
//!
//! Errors are serializable so that an HTTP or IPC layer can forward them to a
//! client unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the DataVerse core.
#[derive(Error, Debug)]
pub enum DataverseError {
    /// Caller-supplied input failed validation (empty industry, blank
    /// instruction, ...). Raised before any side effect.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced data file does not exist in the data directory.
    #[error("CSV file '{0}' not found")]
    FileNotFound(String),

    /// Column was not found in a table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The data directory holds no source CSV files.
    #[error("No CSV files found in '{0}' except the merged file")]
    NoSourceFiles(String),

    /// No merged table is available (nothing to merge, or it was never built).
    #[error("No merged data available: no CSV files found or data could not be loaded")]
    NoMergedData,

    /// An LLM collaborator answered with text we could not interpret.
    #[error("Could not parse LLM response: {reason}")]
    UnparsableResponse {
        reason: String,
        raw_response: String,
    },

    /// The data directory holds no SQL script.
    #[error("No SQL file found in the directory")]
    NoSqlFile,

    /// The data directory holds more than one SQL script.
    #[error("Multiple SQL files found ({0}); ensure only one SQL file is present")]
    MultipleSqlFiles(usize),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// AI client error.
    #[error("AI client error: {0}")]
    AiClientError(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error (for AI client, only with "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DataverseError>,
    },
}

impl DataverseError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DataverseError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for client-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoSourceFiles(_) => "NO_SOURCE_FILES",
            Self::NoMergedData => "NO_MERGED_DATA",
            Self::UnparsableResponse { .. } => "UNPARSABLE_RESPONSE",
            Self::NoSqlFile => "NO_SQL_FILE",
            Self::MultipleSqlFiles(_) => "MULTIPLE_SQL_FILES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::AiClientError(_) => "AI_CLIENT_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The raw collaborator output attached to this error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::UnparsableResponse { raw_response, .. } => Some(raw_response),
            Self::WithContext { source, .. } => source.raw_response(),
            _ => None,
        }
    }

    /// Check if this error was caused by the caller rather than the system.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidInput(_) | Self::FileNotFound(_) | Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields, plus
/// `raw_response` when an LLM answer could not be interpreted.
impl Serialize for DataverseError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let raw = self.raw_response();
        let len = if raw.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("DataverseError", len)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        if let Some(raw) = raw {
            state.serialize_field("raw_response", raw)?;
        }
        state.end()
    }
}

/// Result type alias for DataVerse operations.
pub type Result<T> = std::result::Result<T, DataverseError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DataverseError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DataverseError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(DataverseError::NoMergedData.error_code(), "NO_MERGED_DATA");
        assert_eq!(
            DataverseError::FileNotFound("sales.csv".to_string()).error_code(),
            "FILE_NOT_FOUND"
        );
    }

    #[test]
    fn test_is_input_error() {
        assert!(DataverseError::InvalidInput("empty".to_string()).is_input_error());
        assert!(DataverseError::FileNotFound("x.csv".to_string()).is_input_error());
        assert!(!DataverseError::NoSqlFile.is_input_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = DataverseError::FileNotFound("orders.csv".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("FILE_NOT_FOUND"));
        assert!(json.contains("orders.csv"));
        assert!(!json.contains("raw_response"));
    }

    #[test]
    fn test_unparsable_response_serializes_raw_text() {
        let error = DataverseError::UnparsableResponse {
            reason: "no list found".to_string(),
            raw_response: "I think maybe...".to_string(),
        };
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["code"], "UNPARSABLE_RESPONSE");
        assert_eq!(value["raw_response"], "I think maybe...");
    }

    #[test]
    fn test_with_context() {
        let error = DataverseError::NoSqlFile.with_context("Reading SQL contents");
        assert!(error.to_string().contains("Reading SQL contents"));
        assert_eq!(error.error_code(), "NO_SQL_FILE"); // Preserves original code
    }

    #[test]
    fn test_with_context_keeps_raw_response() {
        let error = DataverseError::UnparsableResponse {
            reason: "empty".to_string(),
            raw_response: "[]".to_string(),
        }
        .with_context("Reducing files");
        assert_eq!(error.raw_response(), Some("[]"));
    }
}
