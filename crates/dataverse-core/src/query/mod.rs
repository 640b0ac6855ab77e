//! Question answering over the merged table.

use crate::ai::{AIProvider, complete_with};
use crate::error::{DataverseError, Result};
use crate::types::QueryAnswer;
use crate::utils::{schema_summary, to_csv_string};
use polars::prelude::*;
use tracing::info;

/// Build the prompt for a question about `table`.
///
/// The first `sample_rows` rows are included as CSV next to the schema.
pub fn build_question_prompt(question: &str, table: &DataFrame, sample_rows: usize) -> Result<String> {
    let mut head = table.head(Some(sample_rows));
    let sample = to_csv_string(&mut head)?;

    Ok(format!(
        "You are a data analyst answering questions about a table merged from several CSV files.\n\
         Every column is named <file>__<column>, where <file> is the source file name without extension.\n\
         The table has {rows} rows and {cols} columns.\n\n\
         COLUMNS:\n{schema}\n\n\
         FIRST {shown} ROWS:\n{sample}\n\
         QUESTION: {question}\n\n\
         Answer concisely from the data above. If the rows shown are not enough to answer exactly, say so.",
        rows = table.height(),
        cols = table.width(),
        schema = schema_summary(table),
        shown = head.height(),
    ))
}

/// Answer a natural-language question about the merged table.
pub fn ask_question(
    question: &str,
    table: &DataFrame,
    provider: &dyn AIProvider,
    sample_rows: usize,
) -> Result<QueryAnswer> {
    let question = question.trim();
    if question.is_empty() {
        return Err(DataverseError::InvalidInput(
            "Question cannot be empty".to_string(),
        ));
    }

    info!("Answering question over {} merged columns", table.width());
    let prompt = build_question_prompt(question, table, sample_rows.max(1))?;
    let output = complete_with(provider, &prompt)?.trim().to_string();

    Ok(QueryAnswer { output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        prompt: Mutex<Option<String>>,
    }

    impl AIProvider for Recording {
        fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            *self.prompt.lock().unwrap() = Some(prompt.to_string());
            Ok("  There are 3 sales.\n".to_string())
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    fn merged() -> DataFrame {
        df![
            "sales__id" => [1i64, 2, 3],
            "sales__amount" => [10.0, 20.0, 30.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_ask_question_trims_answer() {
        let provider = Recording {
            prompt: Mutex::new(None),
        };

        let answer = ask_question("How many sales?", &merged(), &provider, 2).unwrap();
        assert_eq!(answer.output, "There are 3 sales.");

        let prompt = provider.prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("QUESTION: How many sales?"));
        assert!(prompt.contains("FIRST 2 ROWS:"));
        assert!(prompt.contains("- sales__amount (f64, 0 nulls)"));
        assert!(prompt.contains("The table has 3 rows and 2 columns"));
    }

    #[test]
    fn test_blank_question_is_rejected() {
        let provider = Recording {
            prompt: Mutex::new(None),
        };

        let err = ask_question("   ", &merged(), &provider, 20).unwrap_err();
        assert!(err.is_input_error());
        assert!(provider.prompt.lock().unwrap().is_none());
    }
}
