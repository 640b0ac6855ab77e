//! File reduction.
//!
//! Summarizes every source CSV of the data directory, asks an [`AIProvider`]
//! which ones matter most and deletes the rest.
//!
//! [`AIProvider`]: crate::ai::AIProvider

mod response;
mod selector;
mod summary;

pub use response::extract_file_list;
pub use selector::{build_ranking_prompt, reduce_files};
pub use summary::{summarize_file, summarize_files};
