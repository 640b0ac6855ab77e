//! Column classification.

use crate::types::ColumnKind;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Classify a dtype: integer and float types are numeric, everything else textual.
pub fn classify_dtype(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Textual
    }
}

/// Classify a column by the type the CSV reader inferred for it.
///
/// There is no date kind: date-ness is discovered later by parsing textual
/// columns.
pub fn classify_column(series: &Series) -> ColumnKind {
    classify_dtype(series.dtype())
}
