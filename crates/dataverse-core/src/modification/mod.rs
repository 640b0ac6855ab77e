//! Natural-language table modification.
//!
//! A [`TableEditor`] turns an instruction into a new version of a table. The
//! shipped [`LlmTableEditor`] asks an LLM for an [`EditPlan`] (a JSON list of
//! operations) and applies it with Polars, so the model never runs code.

mod batch;
mod editor;
mod plan;

pub use batch::{modify_csv_file, process_instruction_file};
pub use editor::{LlmTableEditor, TableEdit, TableEditor};
pub use plan::{EditOperation, EditPlan, parse_edit_plan};
