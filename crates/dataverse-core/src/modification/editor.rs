use super::plan::parse_edit_plan;
use crate::ai::{AIProvider, complete_with};
use crate::error::Result;
use crate::utils::{schema_summary, to_csv_string};
use polars::prelude::*;
use tracing::debug;

/// Rows of the table shown to the model.
const PROMPT_SAMPLE_ROWS: usize = 10;

/// A table after an edit, with a description of what changed.
#[derive(Debug, Clone)]
pub struct TableEdit {
    pub table: DataFrame,
    pub explanation: String,
}

/// Applies a natural-language instruction to a table.
///
/// Implementations always hand back the full resulting table.
pub trait TableEditor {
    fn edit(&self, table: DataFrame, instruction: &str) -> Result<TableEdit>;
}

/// [`TableEditor`] that asks an [`AIProvider`] for an edit plan and applies it.
pub struct LlmTableEditor<P: AIProvider> {
    provider: P,
}

impl<P: AIProvider> LlmTableEditor<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Build the prompt asking for an edit plan.
    pub fn build_prompt(table: &DataFrame, instruction: &str) -> Result<String> {
        let mut head = table.head(Some(PROMPT_SAMPLE_ROWS));
        let sample = to_csv_string(&mut head)?;

        Ok(format!(
            "You are a data engineer editing a CSV table with {rows} rows.\n\n\
             COLUMNS:\n{schema}\n\n\
             FIRST ROWS:\n{sample}\n\
             INSTRUCTION: {instruction}\n\n\
             Reply with a single JSON object and nothing else:\n\
             {{\"operations\": [...], \"explanation\": \"<one sentence describing the change>\"}}\n\n\
             Each operation is one of:\n\
             {{\"op\": \"fill_nulls\", \"column\": \"c\", \"value\": <number or string>}}\n\
             {{\"op\": \"replace_value\", \"column\": \"c\", \"from\": \"old\", \"to\": \"new\"}} (omit \"to\" to clear to null)\n\
             {{\"op\": \"drop_column\", \"column\": \"c\"}}\n\
             {{\"op\": \"rename_column\", \"column\": \"c\", \"new_name\": \"d\"}}\n\
             {{\"op\": \"drop_null_rows\", \"columns\": [\"c\"]}} (omit \"columns\" to check every column)\n\
             {{\"op\": \"drop_rows_where\", \"column\": \"c\", \"equals\": \"value\"}}\n\
             Use only the column names listed above.",
            rows = table.height(),
            schema = schema_summary(table),
        ))
    }
}

impl<P: AIProvider> TableEditor for LlmTableEditor<P> {
    fn edit(&self, table: DataFrame, instruction: &str) -> Result<TableEdit> {
        let prompt = Self::build_prompt(&table, instruction)?;
        let response = complete_with(&self.provider, &prompt)?;
        let plan = parse_edit_plan(&response)?;

        debug!(
            "Applying {} operations: {}",
            plan.operations.len(),
            plan.explanation
        );
        let table = plan.apply(table)?;

        Ok(TableEdit {
            table,
            explanation: plan.explanation,
        })
    }
}
