//! Short text summaries of CSV files, used to build the ranking prompt.

use crate::error::Result;
use crate::utils::{read_csv_head, string_values};
use polars::prelude::*;
use serde_json::{Number, Value};
use std::path::Path;

/// Summarize one file as name, column list and first data row.
///
/// At most `sample_rows` rows are read. A file that cannot be read, or has no
/// data row, gets a "Could not read file" summary instead.
pub fn summarize_file(dir: &Path, file_name: &str, sample_rows: usize) -> String {
    match read_csv_head(&dir.join(file_name), sample_rows.max(1)).and_then(|df| describe(&df)) {
        Ok(Some((columns, sample))) => {
            format!("File: {file_name}\nColumns: {columns}\nSample:\n{sample}")
        }
        Ok(None) => format!("File: {file_name}\nCould not read file: no data rows"),
        Err(e) => format!("File: {file_name}\nCould not read file: {e}"),
    }
}

/// Summaries of several files, separated by a blank line.
pub fn summarize_files(dir: &Path, file_names: &[String], sample_rows: usize) -> String {
    file_names
        .iter()
        .map(|name| summarize_file(dir, name, sample_rows))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Column list and first row rendered as a JSON object in column order;
/// `None` when the table has no rows.
fn describe(df: &DataFrame) -> Result<Option<(String, String)>> {
    if df.height() == 0 {
        return Ok(None);
    }

    let columns = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut fields = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let key = Value::String(series.name().to_string());
        fields.push(format!("{}: {}", key, first_value(series)?));
    }

    Ok(Some((columns, format!("{{{}}}", fields.join(", ")))))
}

fn first_value(series: &Series) -> Result<Value> {
    let dtype = series.dtype();

    let value = if dtype.is_integer() {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .get(0)
            .map_or(Value::Null, Value::from)
    } else if dtype.is_float() {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .get(0)
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    } else if dtype == &DataType::Boolean {
        series.bool()?.get(0).map_or(Value::Null, Value::Bool)
    } else {
        string_values(&series.head(Some(1)))?
            .into_iter()
            .next()
            .flatten()
            .map_or(Value::Null, Value::String)
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_summarize_file_shape() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("sales.csv"),
            "id,product,amount,paid\n1,Widget,9.5,true\n2,Gadget,3.0,false\n",
        )
        .unwrap();

        let summary = summarize_file(dir.path(), "sales.csv", 3);

        assert_eq!(
            summary,
            "File: sales.csv\n\
             Columns: id, product, amount, paid\n\
             Sample:\n\
             {\"id\": 1, \"product\": \"Widget\", \"amount\": 9.5, \"paid\": true}"
        );
    }

    #[test]
    fn test_summarize_file_null_sample() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("c.csv"), "name,city\n,Oslo\n").unwrap();

        let summary = summarize_file(dir.path(), "c.csv", 3);
        assert!(summary.ends_with("{\"name\": null, \"city\": \"Oslo\"}"));
    }

    #[test]
    fn test_summarize_unreadable_file() {
        let dir = tempdir().unwrap();
        let summary = summarize_file(dir.path(), "ghost.csv", 3);

        assert!(summary.starts_with("File: ghost.csv\nCould not read file:"));
    }

    #[test]
    fn test_summarize_header_only_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("empty.csv"), "a,b\n").unwrap();

        let summary = summarize_file(dir.path(), "empty.csv", 3);
        assert_eq!(summary, "File: empty.csv\nCould not read file: no data rows");
    }

    #[test]
    fn test_summarize_files_joins_with_blank_line() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "x\n1\n").unwrap();
        std::fs::write(dir.path().join("b.csv"), "y\n2\n").unwrap();

        let text = summarize_files(dir.path(), &["a.csv".to_string(), "b.csv".to_string()], 3);
        assert_eq!(text.matches("File: ").count(), 2);
        assert!(text.contains("{\"x\": 1}\n\nFile: b.csv"));
    }
}
