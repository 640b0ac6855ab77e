//! Side-by-side merge of every source file into one prefixed table.
//!
//! Shorter files are padded with nulls to the longest file's height, and the
//! result is persisted as the merged artifact next to the sources.

use crate::error::{DataverseError, Result};
use crate::types::PREFIX_SEPARATOR;
use crate::utils::{file_stem, list_source_csv_files, merged_file_path, read_csv, write_csv};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Column name of `column` once merged from the file with stem `stem`.
pub fn prefixed_name(stem: &str, column: &str) -> String {
    format!("{stem}{PREFIX_SEPARATOR}{column}")
}

/// Merge every source CSV of `dir` into one table.
///
/// Files are taken in name order; unreadable files and files whose stem was
/// already merged are skipped with a warning. Returns `Ok(None)` when nothing
/// could be loaded or the merged table has no rows. Nothing is written.
pub fn merge_folder(dir: &Path, infer_schema_length: Option<usize>) -> Result<Option<DataFrame>> {
    if !dir.is_dir() {
        return Err(DataverseError::FileNotFound(dir.display().to_string()));
    }

    let mut seen_stems = HashSet::new();
    let mut tables = Vec::new();

    for file_name in list_source_csv_files(dir)? {
        let stem = file_stem(&file_name);
        if !seen_stems.insert(stem.clone()) {
            warn!(
                "Skipping {}: prefix '{}' is already taken by another file",
                file_name, stem
            );
            continue;
        }

        match read_csv(&dir.join(&file_name), infer_schema_length) {
            Ok(df) => {
                debug!("Loaded {} ({} x {})", file_name, df.height(), df.width());
                tables.push((stem, df));
            }
            Err(e) => {
                // The stem stays reserved so a later case-variant cannot claim it
                warn!("Skipping unreadable file {}: {}", file_name, e);
            }
        }
    }

    merge_tables(tables)
}

/// Concatenate tables column-wise, prefixing every column with its table's stem.
///
/// Rows are aligned by position; shorter tables are padded with nulls up to
/// the tallest one.
pub fn merge_tables(tables: Vec<(String, DataFrame)>) -> Result<Option<DataFrame>> {
    if tables.is_empty() {
        info!("No CSV files could be loaded, nothing to merge");
        return Ok(None);
    }

    let height = tables.iter().map(|(_, df)| df.height()).max().unwrap_or(0);
    if height == 0 {
        info!("All loaded CSV files are empty, nothing to merge");
        return Ok(None);
    }

    let mut columns: Vec<Column> = Vec::new();
    for (stem, df) in &tables {
        let padding = height - df.height();
        if padding > 0 {
            debug!("Padding '{}' with {} null rows", stem, padding);
        }

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = prefixed_name(stem, series.name());
            let mut merged = series.clone().with_name(name.into());
            if padding > 0 {
                merged = merged.extend_constant(AnyValue::Null, padding)?;
            }
            columns.push(merged.into_column());
        }
    }

    let merged = DataFrame::new(columns)?;
    info!(
        "Merged {} files into {} rows x {} columns",
        tables.len(),
        merged.height(),
        merged.width()
    );
    Ok(Some(merged))
}

/// Write a merged table to the reserved artifact path inside `dir`.
pub fn write_merged(dir: &Path, df: &mut DataFrame) -> Result<PathBuf> {
    let path = merged_file_path(dir);
    write_csv(&path, df)?;
    info!("Merged data written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MERGED_FILE_NAME;
    use crate::utils::DEFAULT_INFER_SCHEMA_LENGTH;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect()
    }

    #[test]
    fn test_prefixed_name() {
        assert_eq!(prefixed_name("orders", "id"), "orders__id");
    }

    #[test]
    fn test_merge_prefixes_and_orders_columns() {
        let dir = tempdir().unwrap();
        write(dir.path(), "b.csv", "x,z\n1,p\n2,q\n");
        write(dir.path(), "a.csv", "x,y\n10,u\n20,v\n");

        let merged = merge_folder(dir.path(), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap()
            .unwrap();

        assert_eq!(names(&merged), vec!["a__x", "a__y", "b__x", "b__z"]);
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn test_merge_pads_shorter_tables() {
        let a = df!["x" => [1i64, 2, 3]].unwrap();
        let b = df!["y" => ["p"]].unwrap();

        let merged = merge_tables(vec![("a".to_string(), a), ("b".to_string(), b)])
            .unwrap()
            .unwrap();

        assert_eq!(merged.height(), 3);
        assert_eq!(merged.column("a__x").unwrap().null_count(), 0);
        assert_eq!(merged.column("b__y").unwrap().null_count(), 2);
    }

    #[test]
    fn test_merge_ignores_existing_artifact_and_other_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.csv", "x\n1\n");
        write(dir.path(), MERGED_FILE_NAME, "old__x\n9\n");
        write(dir.path(), "notes.txt", "hello");

        let merged = merge_folder(dir.path(), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap()
            .unwrap();

        assert_eq!(names(&merged), vec!["a__x"]);
    }

    #[test]
    fn test_merge_skips_colliding_stem() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.CSV", "y\n5\n");
        write(dir.path(), "a.csv", "x\n1\n");

        let merged = merge_folder(dir.path(), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap()
            .unwrap();

        // "a.CSV" sorts before "a.csv", so it wins the prefix
        assert_eq!(names(&merged), vec!["a__y"]);
    }

    #[test]
    fn test_merge_empty_inputs_yield_none() {
        let dir = tempdir().unwrap();
        assert!(merge_folder(dir.path(), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap()
            .is_none());

        write(dir.path(), "header_only.csv", "x,y\n");
        assert!(merge_folder(dir.path(), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_merge_missing_directory_is_error() {
        let dir = tempdir().unwrap();
        let result = merge_folder(&dir.path().join("absent"), DEFAULT_INFER_SCHEMA_LENGTH);
        assert!(matches!(result, Err(DataverseError::FileNotFound(_))));
    }

    #[test]
    fn test_write_merged_creates_artifact() {
        let dir = tempdir().unwrap();
        let mut df = df!["a__x" => [1i64, 2]].unwrap();

        let path = write_merged(dir.path(), &mut df).unwrap();

        assert_eq!(path, dir.path().join(MERGED_FILE_NAME));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("a__x\n"));
    }
}
