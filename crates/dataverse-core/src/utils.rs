//! Shared utilities for the DataVerse modules.
//!
//! This module contains the CSV I/O helpers, directory listing rules and
//! Series conversion helpers used across the detectors, the merge engine and
//! the collaborators.

use crate::error::{DataverseError, Result, ResultExt};
use crate::types::MERGED_FILE_NAME;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Schema inference depth when the caller has no preference: the whole file.
pub const DEFAULT_INFER_SCHEMA_LENGTH: Option<usize> = None;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Directory Utilities
// =============================================================================

/// Check if a file name has a `.csv` extension (case-insensitive).
pub fn has_csv_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Check if a file name denotes a source CSV (any CSV but the merged artifact).
pub fn is_source_csv(file_name: &str) -> bool {
    has_csv_extension(file_name) && file_name != MERGED_FILE_NAME
}

/// List the names of all regular `.csv` files in `dir`, sorted by name.
///
/// The merged artifact is included; use [`list_source_csv_files`] to skip it.
pub fn list_csv_files(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .context(format!("Failed to list directory '{}'", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str()
            && has_csv_extension(name)
        {
            files.push(name.to_string());
        }
    }

    files.sort();
    Ok(files)
}

/// List the source CSV files of `dir`, sorted by name, excluding the merged artifact.
pub fn list_source_csv_files(dir: &Path) -> Result<Vec<String>> {
    Ok(list_csv_files(dir)?
        .into_iter()
        .filter(|name| is_source_csv(name))
        .collect())
}

/// Extract the file stem (name without extension).
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// Path of the merged artifact inside `dir`.
pub fn merged_file_path(dir: &Path) -> PathBuf {
    dir.join(MERGED_FILE_NAME)
}

/// Delete a file, ignoring failures.
///
/// Returns `true` when the file is gone afterwards (deleted now or already
/// absent).
pub fn remove_file_best_effort(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            debug!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

// =============================================================================
// CSV I/O
// =============================================================================

/// Read a CSV file from disk into a DataFrame.
///
/// The first row holds the column names; empty fields become nulls. Column
/// types are inferred from the first `infer_schema_length` rows, or from every
/// row when `None`.
pub fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    if !path.exists() {
        return Err(DataverseError::FileNotFound(path.display().to_string()));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to parse '{}'", path.display()))
}

/// Read at most `n_rows` data rows of a CSV file.
pub fn read_csv_head(path: &Path, n_rows: usize) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(n_rows))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to parse '{}'", path.display()))
}

/// Write a DataFrame to `path` as a CSV file with a header row.
pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)
        .context(format!("Failed to create '{}'", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Render a DataFrame as CSV text.
pub fn to_csv_string(df: &mut DataFrame) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(df)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// =============================================================================
// Series Conversion Utilities
// =============================================================================

/// Collect the cells of a Series as optional strings (`None` = null).
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Collect the cells of a numeric Series as optional floats (`None` = null).
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64.f64()?.into_iter().collect())
}

/// One line per column: name, dtype and null count.
pub fn schema_summary(df: &DataFrame) -> String {
    df.get_columns()
        .iter()
        .map(|col| {
            format!(
                "- {} ({}, {} nulls)",
                col.name(),
                col.dtype(),
                col.null_count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let as_f64 = series.cast(&DataType::Float64)?;
    let filled: Vec<Option<f64>> = as_f64
        .f64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let as_str = series.cast(&DataType::String)?;
    let filled: Vec<Option<String>> = as_str
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value).to_string()))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Tests
// =============================================================================
