//! DataVerse Core Library
//!
//! Data-quality analysis, merging and reduction for synthetic CSV datasets
//! generated by an LLM, built with Rust and Polars.
//!
//! # Overview
//!
//! This library works on one data directory of CSV files and provides:
//!
//! - **Quality Analysis**: Missing counts, IQR outliers, implausible dates and sentinel values per file
//! - **Merging**: Side-by-side merge of every file into one prefixed table, persisted as an artifact
//! - **Missing Values by Source**: Missing counts of the merged table grouped by originating file
//! - **Reduction**: LLM-ranked selection of the most relevant files, deleting the rest
//! - **Generation**: LLM-written SQL scripts converted into one CSV per table
//! - **Modification**: Natural-language edits applied to a CSV file, one at a time or in batch
//! - **Questions**: Natural-language questions answered over the merged table
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dataverse_core::{DataverseConfig, DataverseService};
//! use dataverse_core::ai::OpenRouterProvider;
//! use std::sync::Arc;
//!
//! let config = DataverseConfig::builder()
//!     .data_dir("./Industry-Sub_domain Data")
//!     .build()?;
//!
//! let service = DataverseService::builder()
//!     .config(config)
//!     .ai_provider(Arc::new(OpenRouterProvider::from_env()?))
//!     .start()?;
//!
//! for analysis in service.analyze_errors()? {
//!     println!("{}: {:?}", analysis.file_name(), analysis.error());
//! }
//!
//! let reduction = service.reduce_files(3)?;
//! println!("Kept {:?}, removed {:?}", reduction.kept, reduction.removed);
//!
//! service.refresh()?;
//! service.shutdown();
//! ```
//!
//! # Without AI
//!
//! The detectors and the merge engine never call an LLM and can be used on
//! their own:
//!
//! ```rust,ignore
//! use dataverse_core::quality::FileAnalyzer;
//! use dataverse_core::merge::{merge_folder, missing_by_prefix};
//!
//! let reports = FileAnalyzer::default().analyze_folder(dir)?;
//! if let Some(merged) = merge_folder(dir, None)? {
//!     println!("{:?}", missing_by_prefix(&merged));
//! }
//! ```
//!
//! # AI Providers
//!
//! LLM-backed operations go through the [`ai::AIProvider`] trait. The
//! shipped provider is [`ai::OpenRouterProvider`] (feature `ai`, enabled by
//! default). To implement your own provider, see the [`ai`] module
//! documentation.

pub mod ai;
pub mod config;
pub mod error;
pub mod generation;
pub mod merge;
pub mod modification;
pub mod profiler;
pub mod quality;
pub mod query;
pub mod reduction;
pub mod service;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, DataverseConfig, DataverseConfigBuilder};
pub use error::{DataverseError, Result as DataverseResult, ResultExt};
pub use generation::{GenerationMode, SqlGenerator};
pub use merge::{merge_folder, missing_by_prefix};
pub use modification::{EditOperation, EditPlan, LlmTableEditor, TableEditor};
pub use quality::{FileAnalyzer, MissingValueDetector, OutlierDetector};
pub use service::{DataverseService, DataverseServiceBuilder};
pub use types::{
    BatchLineResult, ColumnKind, ColumnOutliers, FileAnalysis, FileReport, GeneratedData,
    LineStatus, MERGED_FILE_NAME, MissingByPrefix, MissingCounts, ModificationOutcome,
    QueryAnswer, ReductionOutcome,
};
