//! Folder merging.
//!
//! All source CSVs of a directory are combined side by side into one table
//! whose columns are namespaced `<file-stem>__<column>`. The prefix reporter
//! reads that namespace back to group missing values per source file.

mod engine;
mod prefix;

pub use engine::{merge_folder, merge_tables, prefixed_name, write_merged};
pub use prefix::{missing_by_prefix, missing_by_prefix_from_file};
