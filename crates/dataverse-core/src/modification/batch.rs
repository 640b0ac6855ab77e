use super::editor::TableEditor;
use crate::error::{DataverseError, Result, ResultExt};
use crate::types::{BatchLineResult, LineStatus, ModificationOutcome};
use crate::utils::{DEFAULT_INFER_SCHEMA_LENGTH, list_csv_files, read_csv, write_csv};
use std::path::Path;
use tracing::{info, warn};

/// Apply one instruction to one CSV file of `dir` and save it in place.
pub fn modify_csv_file(
    dir: &Path,
    file_name: &str,
    instruction: &str,
    editor: &dyn TableEditor,
) -> Result<ModificationOutcome> {
    let instruction = instruction.trim();
    if instruction.is_empty() {
        return Err(DataverseError::InvalidInput(
            "Instruction cannot be empty".to_string(),
        ));
    }

    let file_name = file_name.trim();
    if !list_csv_files(dir)?.iter().any(|name| name == file_name) {
        return Err(DataverseError::FileNotFound(file_name.to_string()));
    }

    let output = apply_instruction(dir, file_name, instruction, editor)?;
    info!("Modified {}", file_name);

    Ok(ModificationOutcome {
        file_name: file_name.to_string(),
        output,
    })
}

/// Apply a file of `filename: instruction` lines, one at a time.
///
/// Blank lines are ignored and do not count towards line numbers. A line
/// that cannot be applied is reported, never fatal; only an unreadable or
/// empty instruction file is an error.
pub fn process_instruction_file(
    instruction_file: &Path,
    dir: &Path,
    editor: &dyn TableEditor,
) -> Result<Vec<BatchLineResult>> {
    let contents = std::fs::read_to_string(instruction_file).context(format!(
        "Could not read file '{}'",
        instruction_file.display()
    ))?;

    let lines: Vec<&str> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(DataverseError::InvalidInput(
            "Instruction file is empty".to_string(),
        ));
    }

    let files = list_csv_files(dir)?;
    let mut results = Vec::with_capacity(lines.len());

    for (idx, line) in lines.iter().enumerate() {
        let number = idx + 1;
        let skipped = |reason: String| BatchLineResult {
            line: number,
            status: LineStatus::Skipped,
            reason: Some(reason),
            output: None,
            line_content: line.to_string(),
        };

        let Some((file_name, instruction)) = line.split_once(':') else {
            results.push(skipped("missing colon".to_string()));
            continue;
        };
        let file_name = file_name.trim();
        let instruction = instruction.trim();

        if !files.iter().any(|name| name == file_name) {
            results.push(skipped(format!("CSV file '{}' not found", file_name)));
            continue;
        }
        if instruction.is_empty() {
            results.push(skipped("empty instruction".to_string()));
            continue;
        }

        let result = match apply_instruction(dir, file_name, instruction, editor) {
            Ok(output) => BatchLineResult {
                line: number,
                status: LineStatus::Success,
                reason: None,
                output: Some(output),
                line_content: line.to_string(),
            },
            Err(e) => {
                warn!("Line {}: could not apply changes to {}: {}", number, file_name, e);
                BatchLineResult {
                    line: number,
                    status: LineStatus::Warning,
                    reason: Some(format!("Could not apply changes: {}", e)),
                    output: None,
                    line_content: line.to_string(),
                }
            }
        };
        results.push(result);
    }

    let applied = results
        .iter()
        .filter(|r| r.status == LineStatus::Success)
        .count();
    info!("Applied {} of {} instructions", applied, results.len());
    Ok(results)
}

fn apply_instruction(
    dir: &Path,
    file_name: &str,
    instruction: &str,
    editor: &dyn TableEditor,
) -> Result<String> {
    let path = dir.join(file_name);
    let table = read_csv(&path, DEFAULT_INFER_SCHEMA_LENGTH)?;
    let mut edit = editor.edit(table, instruction)?;
    write_csv(&path, &mut edit.table).context("Could not save changes")?;
    Ok(edit.explanation)
}
