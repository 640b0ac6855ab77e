//! Conversion of `INSERT INTO` statements into per-table CSV files.

use crate::error::{DataverseError, Result, ResultExt};
use crate::utils::write_csv;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the SQL script written next to the generated CSVs.
pub const SQL_FILE_NAME: &str = "create_insert_statements.sql";

// Statement head up to and including VALUES; the tuples are scanned by hand
static INSERT_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bINSERT\s+INTO\s+[`"\[]?(\w+)[`"\]]?\s*\(([^)]*)\)\s*VALUES\s*"#)
        .expect("Invalid regex: insert statement")
});

/// Rows collected for one table across all its INSERT statements.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedTable {
    /// Table name, lowercased.
    pub name: String,
    pub columns: Vec<String>,
    /// `None` cells come from unquoted `NULL`.
    pub rows: Vec<Vec<Option<String>>>,
}

impl InsertedTable {
    /// Name of the CSV file this table is written to.
    pub fn file_name(&self) -> String {
        format!("{}_data.csv", self.name)
    }

    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<Option<&str>> =
                    self.rows.iter().map(|row| row[idx].as_deref()).collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        DataFrame::new(columns)
    }
}

/// Collect the rows of every `INSERT INTO ... VALUES ...;` statement.
///
/// Tables appear in order of their first statement. Rows whose value count
/// differs from the column list are skipped with a warning, as are later
/// statements that name a different column list for an already seen table.
pub fn parse_insert_statements(sql: &str) -> Vec<InsertedTable> {
    let mut tables: Vec<InsertedTable> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = INSERT_HEAD.captures_at(sql, pos) {
        let (Some(whole), Some(name), Some(cols)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };

        let name = name.as_str().to_lowercase();
        let columns: Vec<String> = cols.as_str().split(',').map(clean_identifier).collect();
        let (tuples, end) = scan_tuples(sql, whole.end());
        pos = end.max(whole.end());

        let table = match tables.iter_mut().position(|t| t.name == name) {
            Some(idx) => &mut tables[idx],
            None => {
                tables.push(InsertedTable {
                    name: name.clone(),
                    columns: columns.clone(),
                    rows: Vec::new(),
                });
                let last = tables.len() - 1;
                &mut tables[last]
            }
        };

        if table.columns != columns {
            warn!(
                "Skipping INSERT into '{}': column list differs from the first statement",
                name
            );
            continue;
        }

        for tuple in tuples {
            if tuple.len() == columns.len() {
                table.rows.push(tuple);
            } else {
                warn!(
                    "Skipping row of '{}': {} values for {} columns",
                    name,
                    tuple.len(),
                    columns.len()
                );
            }
        }
    }

    tables
}

/// Write one `<table>_data.csv` per table found in `sql` into `dir`.
///
/// Returns the written file names in order of first appearance.
pub fn sql_to_csv(sql: &str, dir: &Path) -> Result<Vec<String>> {
    std::fs::create_dir_all(dir)
        .context(format!("Failed to create directory '{}'", dir.display()))?;

    let tables = parse_insert_statements(sql);
    if tables.is_empty() {
        warn!("No INSERT INTO statements found in the SQL output");
    }

    let mut written = Vec::with_capacity(tables.len());
    for table in &tables {
        let mut df = match table.to_dataframe() {
            Ok(df) => df,
            Err(e) => {
                warn!("Skipping table '{}': {}", table.name, e);
                continue;
            }
        };

        let file_name = table.file_name();
        write_csv(&dir.join(&file_name), &mut df)?;
        debug!("Wrote {} rows to {}", table.rows.len(), file_name);
        written.push(file_name);
    }

    info!("Converted {} tables to CSV", written.len());
    Ok(written)
}

/// Read the single SQL script of `dir`.
pub fn read_sql_contents(dir: &Path) -> Result<String> {
    let entries = std::fs::read_dir(dir)
        .context(format!("Failed to list directory '{}'", dir.display()))?;

    let mut sql_files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str()
            && name.to_lowercase().ends_with(".sql")
        {
            sql_files.push(entry.path());
        }
    }

    match sql_files.as_slice() {
        [] => Err(DataverseError::NoSqlFile),
        [path] => std::fs::read_to_string(path)
            .context(format!("Failed to read '{}'", path.display())),
        many => Err(DataverseError::MultipleSqlFiles(many.len())),
    }
}

fn clean_identifier(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '[' | ']'))
        .to_string()
}

/// Scan `(v, v, ...), (v, ...)` starting at `start`, stopping at the first
/// `;` or non-tuple text. Returns the tuples and the byte offset reached.
fn scan_tuples(sql: &str, start: usize) -> (Vec<Vec<Option<String>>>, usize) {
    let bytes = sql.as_bytes();
    let mut tuples = Vec::new();
    let mut pos = start;

    loop {
        pos = skip_ws(bytes, pos);
        if bytes.get(pos) != Some(&b'(') {
            break;
        }
        let Some((tuple, end)) = scan_tuple(sql, pos + 1) else {
            // Unterminated tuple: nothing after it can be trusted
            return (tuples, sql.len());
        };
        tuples.push(tuple);
        pos = skip_ws(bytes, end);

        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b';') => {
                pos += 1;
                break;
            }
            _ => break,
        }
    }

    (tuples, pos)
}

/// Scan the fields of one tuple whose opening parenthesis precedes `start`.
/// Returns the fields and the offset just past the closing parenthesis.
fn scan_tuple(sql: &str, start: usize) -> Option<(Vec<Option<String>>, usize)> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut depth = 0usize;
    let mut chars = sql[start..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                // Quoted literal; a doubled quote is an escaped quote
                quoted = true;
                loop {
                    let (_, inner) = chars.next()?;
                    if inner == c {
                        if chars.next_if(|&(_, next)| next == c).is_some() {
                            current.push(c);
                        } else {
                            break;
                        }
                    } else {
                        current.push(inner);
                    }
                }
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' if depth > 0 => {
                depth -= 1;
                current.push(c);
            }
            ')' => {
                fields.push(finish_field(&current, quoted));
                return Some((fields, start + offset + 1));
            }
            ',' if depth == 0 => {
                fields.push(finish_field(&current, quoted));
                current.clear();
                quoted = false;
            }
            _ => current.push(c),
        }
    }

    None
}

fn finish_field(raw: &str, quoted: bool) -> Option<String> {
    if quoted {
        return Some(raw.trim().to_string());
    }
    let value = raw.trim();
    if value.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(value.to_string())
    }
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{DEFAULT_INFER_SCHEMA_LENGTH, read_csv, string_values};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_parse_multi_row_insert() {
        let sql = "CREATE TABLE Artists (id INT, name TEXT);\n\
                   INSERT INTO Artists (id, name, country) VALUES\n  \
                   (1, 'Taylor Swift', 'US'),\n  \
                   (2, 'Taylr Swft', NULL),\n  \
                   (3, 'O''Brien, Jr.', 'XX');";

        let tables = parse_insert_statements(sql);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "artists");
        assert_eq!(tables[0].columns, vec!["id", "name", "country"]);
        assert_eq!(
            tables[0].rows,
            vec![
                cells(&[Some("1"), Some("Taylor Swift"), Some("US")]),
                cells(&[Some("2"), Some("Taylr Swft"), None]),
                cells(&[Some("3"), Some("O'Brien, Jr."), Some("XX")]),
            ]
        );
    }

    #[test]
    fn test_quoted_null_stays_text() {
        let sql = "insert into t (a, b) values ('NULL', null);";
        let tables = parse_insert_statements(sql);
        assert_eq!(tables[0].rows, vec![cells(&[Some("NULL"), None])]);
    }

    #[test]
    fn test_statements_for_same_table_accumulate() {
        let sql = "INSERT INTO Sales (id, amount) VALUES (1, 10.5);\n\
                   INSERT INTO Orders (id) VALUES (7);\n\
                   INSERT INTO Sales (id, amount) VALUES (2, -500), (3, 9999);";

        let tables = parse_insert_statements(sql);

        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sales", "orders"]);
        assert_eq!(tables[0].rows.len(), 3);
        assert_eq!(tables[1].rows, vec![cells(&[Some("7")])]);
    }

    #[test]
    fn test_row_with_wrong_arity_is_skipped() {
        let sql = "INSERT INTO t (a, b) VALUES (1, 2), (3), (4, 5, 6), (7, 8);";
        let tables = parse_insert_statements(sql);
        assert_eq!(
            tables[0].rows,
            vec![cells(&[Some("1"), Some("2")]), cells(&[Some("7"), Some("8")])]
        );
    }

    #[test]
    fn test_function_call_values_keep_parentheses() {
        let sql = "INSERT INTO t (a, b) VALUES (NOW(), ROUND(1.5, 0));";
        let tables = parse_insert_statements(sql);
        assert_eq!(
            tables[0].rows,
            vec![cells(&[Some("NOW()"), Some("ROUND(1.5, 0)")])]
        );
    }

    #[test]
    fn test_no_inserts() {
        assert!(parse_insert_statements("SELECT 1;").is_empty());
    }

    #[test]
    fn test_sql_to_csv_writes_files() {
        let dir = tempdir().unwrap();
        let sql = "INSERT INTO Customers (id, country) VALUES (1, 'US'), (2, NULL), (3, 'XX');\n\
                   INSERT INTO Products (sku) VALUES ('A-1');";

        let written = sql_to_csv(sql, dir.path()).unwrap();
        assert_eq!(written, vec!["customers_data.csv", "products_data.csv"]);

        let df = read_csv(&dir.path().join("customers_data.csv"), DEFAULT_INFER_SCHEMA_LENGTH)
            .unwrap();
        assert_eq!(df.shape(), (3, 2));
        let country = string_values(df.column("country").unwrap().as_materialized_series()).unwrap();
        assert_eq!(country, cells(&[Some("US"), None, Some("XX")]));
    }

    #[test]
    fn test_read_sql_contents() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_sql_contents(dir.path()),
            Err(DataverseError::NoSqlFile)
        ));

        std::fs::write(dir.path().join(SQL_FILE_NAME), "SELECT 1;").unwrap();
        assert_eq!(read_sql_contents(dir.path()).unwrap(), "SELECT 1;");

        std::fs::write(dir.path().join("other.SQL"), "SELECT 2;").unwrap();
        assert!(matches!(
            read_sql_contents(dir.path()),
            Err(DataverseError::MultipleSqlFiles(2))
        ));
    }
}
