//! Synthetic data generation.
//!
//! An [`AIProvider`](crate::ai::AIProvider) writes a SQL script for an
//! industry and sub-domain; its `INSERT INTO` statements become the CSV files
//! of the data directory.

mod generator;
mod sql_to_csv;

pub use generator::{GenerationMode, SqlGenerator, build_generation_prompt, clean_sql_output};
pub use sql_to_csv::{
    InsertedTable, SQL_FILE_NAME, parse_insert_statements, read_sql_contents, sql_to_csv,
};
