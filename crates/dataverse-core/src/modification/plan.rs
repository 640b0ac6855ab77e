//! Edit plans: the JSON operation lists an editor applies to a table.

use crate::error::{DataverseError, Result};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One table operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    /// Replace nulls of a column with a value.
    FillNulls { column: String, value: Value },
    /// Replace cells equal to `from`; a missing `to` clears them to null.
    ReplaceValue {
        column: String,
        from: String,
        #[serde(default)]
        to: Option<String>,
    },
    DropColumn { column: String },
    RenameColumn { column: String, new_name: String },
    /// Drop rows holding a null in any of `columns` (every column when absent).
    DropNullRows {
        #[serde(default)]
        columns: Option<Vec<String>>,
    },
    /// Drop rows whose cell equals `equals`.
    DropRowsWhere { column: String, equals: String },
}

/// Operations plus a human-readable explanation of the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    #[serde(default)]
    pub operations: Vec<EditOperation>,
    #[serde(default)]
    pub explanation: String,
}

impl EditPlan {
    /// Apply every operation in order.
    pub fn apply(&self, mut df: DataFrame) -> Result<DataFrame> {
        for op in &self.operations {
            df = op.apply(df)?;
        }
        Ok(df)
    }
}

/// Parse the plan out of an editor reply.
///
/// The reply may wrap the JSON object in prose or fences; the span from the
/// first `{` to the last `}` is parsed.
pub fn parse_edit_plan(response: &str) -> Result<EditPlan> {
    let unparsable = |reason: String| DataverseError::UnparsableResponse {
        reason,
        raw_response: response.to_string(),
    };

    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return Err(unparsable("No JSON object in the response".to_string()));
    };
    if end < start {
        return Err(unparsable("No JSON object in the response".to_string()));
    }

    serde_json::from_str(&response[start..=end])
        .map_err(|e| unparsable(format!("Invalid edit plan: {e}")))
}

impl EditOperation {
    /// Apply this operation, returning the new table.
    pub fn apply(&self, mut df: DataFrame) -> Result<DataFrame> {
        match self {
            EditOperation::FillNulls { column, value } => {
                let series = require_column(&df, column)?;
                let filled = fill_nulls(&series, value)?;
                df.replace(column, filled)?;
                Ok(df)
            }
            EditOperation::ReplaceValue { column, from, to } => {
                let series = require_column(&df, column)?;
                let replaced = replace_value(&series, from, to.as_deref())?;
                df.replace(column, replaced)?;
                Ok(df)
            }
            EditOperation::DropColumn { column } => {
                ensure_column(&df, column)?;
                Ok(df.drop(column)?)
            }
            EditOperation::RenameColumn { column, new_name } => {
                ensure_column(&df, column)?;
                df.rename(column, new_name.as_str().into())?;
                Ok(df)
            }
            EditOperation::DropNullRows { columns } => {
                let names: Vec<String> = match columns {
                    Some(names) => names.clone(),
                    None => df
                        .get_column_names()
                        .iter()
                        .map(|n| n.to_string())
                        .collect(),
                };

                let mut keep = vec![true; df.height()];
                for name in &names {
                    let series = require_column(&df, name)?;
                    for (idx, valid) in series.is_not_null().into_iter().enumerate() {
                        if valid != Some(true) {
                            keep[idx] = false;
                        }
                    }
                }

                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                Ok(df.filter(&mask)?)
            }
            EditOperation::DropRowsWhere { column, equals } => {
                let series = require_column(&df, column)?;
                let keep: Vec<bool> = string_values(&series)?
                    .iter()
                    .map(|cell| !cell_matches(cell.as_deref(), equals))
                    .collect();

                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                Ok(df.filter(&mask)?)
            }
        }
    }
}

fn ensure_column(df: &DataFrame, name: &str) -> Result<()> {
    df.get_column_index(name)
        .map(|_| ())
        .ok_or_else(|| DataverseError::ColumnNotFound(name.to_string()))
}

fn require_column(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map(|col| col.as_materialized_series().clone())
        .map_err(|_| DataverseError::ColumnNotFound(name.to_string()))
}

/// Whether a cell's text equals `target`, ignoring a float's trailing `.0`.
fn cell_matches(cell: Option<&str>, target: &str) -> bool {
    match cell {
        Some(text) => text == target || text.strip_suffix(".0") == Some(target),
        None => false,
    }
}

fn fill_nulls(series: &Series, value: &Value) -> Result<Series> {
    if is_numeric_dtype(series.dtype()) {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(number) = number {
            let filled = fill_numeric_nulls(series, number)?;
            return Ok(restore_integer_dtype(filled, series.dtype())?);
        }
    }

    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(fill_string_nulls(series, &text)?)
}

fn replace_value(series: &Series, from: &str, to: Option<&str>) -> Result<Series> {
    if is_numeric_dtype(series.dtype())
        && let Ok(from_num) = from.trim().parse::<f64>()
    {
        let to_num = match to {
            Some(text) => Some(text.trim().parse::<f64>().map_err(|_| {
                DataverseError::InvalidInput(format!(
                    "'{}' is not a number for numeric column '{}'",
                    text,
                    series.name()
                ))
            })?),
            None => None,
        };

        let replaced: Vec<Option<f64>> = numeric_values(series)?
            .into_iter()
            .map(|v| if v == Some(from_num) { to_num } else { v })
            .collect();
        let replaced = Series::new(series.name().clone(), replaced);
        return Ok(restore_integer_dtype(replaced, series.dtype())?);
    }

    let replaced: Vec<Option<String>> = string_values(series)?
        .into_iter()
        .map(|cell| {
            if cell.as_deref() == Some(from) {
                to.map(str::to_string)
            } else {
                cell
            }
        })
        .collect();
    Ok(Series::new(series.name().clone(), replaced))
}

/// Cast a float result back to the column's integer dtype when no value
/// has a fractional part.
fn restore_integer_dtype(series: Series, original: &DataType) -> PolarsResult<Series> {
    if !original.is_integer() {
        return Ok(series);
    }
    let integral = series
        .f64()?
        .into_iter()
        .flatten()
        .all(|v| v.fract() == 0.0);
    if integral {
        series.cast(original)
    } else {
        Ok(series)
    }
}
