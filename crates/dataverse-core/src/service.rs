//! Service facade over one data directory.
//!
//! [`DataverseService`] owns the lifecycle of the merged artifact: it is
//! built and written at [`start`](DataverseServiceBuilder::start), rebuilt on
//! [`refresh`](DataverseService::refresh) and deleted on
//! [`shutdown`](DataverseService::shutdown). Every other operation delegates
//! to the library modules with the service's configuration.

use crate::ai::AIProvider;
use crate::config::DataverseConfig;
use crate::error::{DataverseError, Result, ResultExt};
use crate::generation::{GenerationMode, SqlGenerator, read_sql_contents};
use crate::merge::{merge_folder, missing_by_prefix_from_file, write_merged};
use crate::modification::{LlmTableEditor, modify_csv_file, process_instruction_file};
use crate::quality::FileAnalyzer;
use crate::query;
use crate::reduction;
use crate::types::{
    BatchLineResult, FileAnalysis, GeneratedData, MissingByPrefix, ModificationOutcome,
    QueryAnswer, ReductionOutcome,
};
use crate::utils::{merged_file_path, remove_file_best_effort};
use parking_lot::RwLock;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// DataVerse operations bound to one data directory.
///
/// # Example
///
/// ```rust,ignore
/// use dataverse_core::{DataverseConfig, DataverseService};
/// use dataverse_core::ai::OpenRouterProvider;
/// use std::sync::Arc;
///
/// let service = DataverseService::builder()
///     .config(DataverseConfig::builder().data_dir("./data").build()?)
///     .ai_provider(Arc::new(OpenRouterProvider::from_env()?))
///     .start()?;
///
/// let reports = service.analyze_errors()?;
/// service.shutdown();
/// ```
pub struct DataverseService {
    config: DataverseConfig,
    ai_provider: Option<Arc<dyn AIProvider>>,
    merged: RwLock<Option<DataFrame>>,
}

static_assertions::assert_impl_all!(DataverseService: Send, Sync);

impl DataverseService {
    /// Create a new service builder.
    pub fn builder() -> DataverseServiceBuilder {
        DataverseServiceBuilder::default()
    }

    pub fn config(&self) -> &DataverseConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Rebuild the merged table and rewrite the artifact.
    ///
    /// Returns whether merged data is available afterwards. When nothing can
    /// be merged, a stale artifact is removed.
    pub fn refresh(&self) -> Result<bool> {
        let dir = self.data_dir();
        let merged = match merge_folder(dir, self.config.infer_schema_length)? {
            Some(mut df) => {
                write_merged(dir, &mut df)?;
                Some(df)
            }
            None => {
                remove_file_best_effort(&merged_file_path(dir));
                None
            }
        };

        let available = merged.is_some();
        *self.merged.write() = merged;
        info!("Merged data refreshed (available: {})", available);
        Ok(available)
    }

    /// A copy of the cached merged table, if any.
    pub fn merged_table(&self) -> Option<DataFrame> {
        self.merged.read().clone()
    }

    /// Data quality reports of every source CSV.
    pub fn analyze_errors(&self) -> Result<Vec<FileAnalysis>> {
        FileAnalyzer::new(self.config.infer_schema_length).analyze_folder(self.data_dir())
    }

    /// Missing values of the on-disk merged artifact, grouped by source file.
    pub fn missing_values(&self) -> Result<MissingByPrefix> {
        let path = merged_file_path(self.data_dir());
        if !path.exists() {
            return Err(DataverseError::NoMergedData);
        }
        missing_by_prefix_from_file(&path, self.config.infer_schema_length)
    }

    /// Keep the `n_keep` most relevant source files and delete the others.
    pub fn reduce_files(&self, n_keep: usize) -> Result<ReductionOutcome> {
        let provider = self.require_provider()?;
        reduction::reduce_files(
            self.data_dir(),
            n_keep,
            provider.as_ref(),
            self.config.summary_rows,
        )
    }

    /// Replace the directory's data with freshly generated tables.
    pub fn generate_data(
        &self,
        industry: &str,
        subdomain: &str,
        mode: GenerationMode,
    ) -> Result<GeneratedData> {
        let provider = self.require_provider()?;
        SqlGenerator::new(provider.as_ref(), self.data_dir())
            .with_mode(mode)
            .generate(industry, subdomain)
    }

    /// Apply one natural-language instruction to one CSV file.
    pub fn modify_file(&self, file_name: &str, instruction: &str) -> Result<ModificationOutcome> {
        let editor = LlmTableEditor::new(self.require_provider()?);
        modify_csv_file(self.data_dir(), file_name, instruction, &editor)
    }

    /// Apply an instruction file of `filename: instruction` lines.
    pub fn modify_batch(&self, instruction_file: &Path) -> Result<Vec<BatchLineResult>> {
        let editor = LlmTableEditor::new(self.require_provider()?);
        process_instruction_file(instruction_file, self.data_dir(), &editor)
    }

    /// Answer a question about the cached merged table.
    pub fn ask_question(&self, question: &str) -> Result<QueryAnswer> {
        let provider = self.require_provider()?;
        let guard = self.merged.read();
        let table = guard.as_ref().ok_or(DataverseError::NoMergedData)?;
        query::ask_question(question, table, provider.as_ref(), self.config.query_sample_rows)
    }

    /// Text of the directory's single SQL script.
    pub fn sql_contents(&self) -> Result<String> {
        read_sql_contents(self.data_dir())
    }

    /// Drop the cache and, when configured, delete the merged artifact.
    ///
    /// Returns whether the artifact is gone afterwards.
    pub fn shutdown(&self) -> bool {
        *self.merged.write() = None;

        if !self.config.cleanup_on_shutdown {
            debug!("Keeping merged artifact on shutdown");
            return false;
        }

        let path = merged_file_path(self.data_dir());
        let removed = remove_file_best_effort(&path);
        if removed {
            info!("Removed {}", path.display());
        } else {
            warn!("Could not remove {}", path.display());
        }
        removed
    }

    fn require_provider(&self) -> Result<Arc<dyn AIProvider>> {
        self.ai_provider.clone().ok_or_else(|| {
            DataverseError::AiClientError("No AI provider configured".to_string())
        })
    }
}

/// Builder for [`DataverseService`].
#[derive(Default)]
pub struct DataverseServiceBuilder {
    config: Option<DataverseConfig>,
    ai_provider: Option<Arc<dyn AIProvider>>,
}

impl DataverseServiceBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: DataverseConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the AI provider used by the LLM-backed operations.
    pub fn ai_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Validate the configuration, create the data directory when missing and
    /// build the merged table.
    pub fn start(self) -> Result<DataverseService> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        std::fs::create_dir_all(&config.data_dir).context(format!(
            "Failed to create data directory '{}'",
            config.data_dir.display()
        ))?;

        if let Some(provider) = &self.ai_provider {
            debug!(
                "Using AI provider {} ({})",
                provider.name(),
                provider.model().unwrap_or("default model")
            );
        }

        let service = DataverseService {
            config,
            ai_provider: self.ai_provider,
            merged: RwLock::new(None),
        };
        service.refresh()?;
        Ok(service)
    }
}
