//! Keeps the files an LLM ranks as most relevant and deletes the rest.

use super::response::extract_file_list;
use super::summary::summarize_files;
use crate::ai::{AIProvider, complete_with};
use crate::error::{DataverseError, Result};
use crate::types::{MERGED_FILE_NAME, ReductionOutcome};
use crate::utils::{is_source_csv, list_csv_files, remove_file_best_effort};
use std::path::Path;
use tracing::{info, warn};

/// Build the ranking prompt sent to the collaborator.
pub fn build_ranking_prompt(summaries: &str, n_keep: usize) -> String {
    format!(
        "You are a data analyst. Here are summaries of CSV files:\n\n\
         {summaries}\n\n\
         From the above, select the {n_keep} most important files to keep (based on file names and file data).\n\
         IMPORTANT: The important files are the ones that contain sales, order and customer information \
         or details about the product or the industry sub-domain. Make sure all the important files are kept.\n\
         Return only the file names as a list, with no explanation or formatting, and do not include \
         markdown or code blocks.\n\
         For example: ['file1.csv', 'file2.csv']"
    )
}

/// Keep the `n_keep` files the collaborator ranks highest and delete the others.
///
/// The merged artifact is never a candidate, never deleted and always listed
/// last in `kept`. When the reply holds no usable list, nothing is deleted and
/// [`DataverseError::UnparsableResponse`] carries the raw reply.
pub fn reduce_files(
    dir: &Path,
    n_keep: usize,
    provider: &dyn AIProvider,
    summary_rows: usize,
) -> Result<ReductionOutcome> {
    if !dir.is_dir() {
        return Err(DataverseError::FileNotFound(dir.display().to_string()));
    }

    let files = list_csv_files(dir)?;
    let candidates: Vec<String> = files
        .iter()
        .filter(|name| is_source_csv(name))
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(DataverseError::NoSourceFiles(dir.display().to_string()));
    }

    info!(
        "Ranking {} candidate files, keeping {}",
        candidates.len(),
        n_keep
    );

    let summaries = summarize_files(dir, &candidates, summary_rows);
    let response = complete_with(provider, &build_ranking_prompt(&summaries, n_keep))?;

    let Some(mut kept) = extract_file_list(&response) else {
        return Err(DataverseError::UnparsableResponse {
            reason: "Could not find a list of file names in the response".to_string(),
            raw_response: response,
        });
    };

    kept.truncate(n_keep);
    kept.push(MERGED_FILE_NAME.to_string());

    let removed: Vec<String> = candidates
        .into_iter()
        .filter(|name| !kept.contains(name))
        .collect();

    for name in &removed {
        if !remove_file_best_effort(&dir.join(name)) {
            warn!("Could not delete {}", name);
        }
    }

    info!("Kept {} files, removed {}", kept.len(), removed.len());
    Ok(ReductionOutcome { kept, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct Scripted(&'static str);

    impl AIProvider for Scripted {
        fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    fn seed(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), "id,value\n1,a\n").unwrap();
        }
    }

    #[test]
    fn test_prompt_mentions_count_and_files() {
        let prompt = build_ranking_prompt("File: a.csv\nColumns: x", 4);
        assert!(prompt.contains("File: a.csv"));
        assert!(prompt.contains("select the 4 most important files"));
    }

    #[test]
    fn test_reduce_truncates_to_n_keep() {
        let dir = tempdir().unwrap();
        seed(dir.path(), &["a.csv", "b.csv", "c.csv"]);

        let outcome = reduce_files(dir.path(), 1, &Scripted("['b.csv', 'a.csv']"), 3).unwrap();

        assert_eq!(outcome.kept, vec!["b.csv", MERGED_FILE_NAME]);
        assert_eq!(outcome.removed, vec!["a.csv", "c.csv"]);
        assert!(dir.path().join("b.csv").exists());
        assert!(!dir.path().join("a.csv").exists());
        assert!(!dir.path().join("c.csv").exists());
    }

    #[test]
    fn test_reduce_never_deletes_merged_artifact() {
        let dir = tempdir().unwrap();
        seed(dir.path(), &["a.csv", MERGED_FILE_NAME]);

        let outcome = reduce_files(dir.path(), 5, &Scripted("[\"zzz.csv\"]"), 3).unwrap();

        assert_eq!(outcome.kept, vec!["zzz.csv", MERGED_FILE_NAME]);
        assert_eq!(outcome.removed, vec!["a.csv"]);
        assert!(dir.path().join(MERGED_FILE_NAME).exists());
    }

    #[test]
    fn test_reduce_unparsable_response_deletes_nothing() {
        let dir = tempdir().unwrap();
        seed(dir.path(), &["a.csv", "b.csv"]);

        let err = reduce_files(dir.path(), 1, &Scripted("I think maybe..."), 3).unwrap_err();

        assert_eq!(err.raw_response(), Some("I think maybe..."));
        assert!(dir.path().join("a.csv").exists());
        assert!(dir.path().join("b.csv").exists());
    }

    #[test]
    fn test_reduce_without_candidates() {
        let dir = tempdir().unwrap();
        seed(dir.path(), &[MERGED_FILE_NAME]);

        let err = reduce_files(dir.path(), 1, &Scripted("['a.csv']"), 3).unwrap_err();
        assert!(matches!(err, DataverseError::NoSourceFiles(_)));
        assert!(dir.path().join(MERGED_FILE_NAME).exists());
    }

    #[test]
    fn test_reduce_provider_failure_deletes_nothing() {
        struct Down;
        impl AIProvider for Down {
            fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
                Err(anyhow::anyhow!("timeout"))
            }
            fn name(&self) -> &str {
                "Down"
            }
        }

        let dir = tempdir().unwrap();
        seed(dir.path(), &["a.csv"]);

        let err = reduce_files(dir.path(), 1, &Down, 3).unwrap_err();
        assert!(matches!(err, DataverseError::AiClientError(_)));
        assert!(dir.path().join("a.csv").exists());
    }
}
