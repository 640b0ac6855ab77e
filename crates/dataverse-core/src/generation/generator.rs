use super::sql_to_csv::{SQL_FILE_NAME, sql_to_csv};
use crate::ai::{AIProvider, complete_with};
use crate::error::{DataverseError, Result, ResultExt};
use crate::types::GeneratedData;
use crate::utils::{has_csv_extension, remove_file_best_effort};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Kind of synthetic data to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Clean, plausible data.
    Ideal,
    /// Data seeded with realistic quality problems.
    #[default]
    WithErrors,
}

const ERROR_RULES: &str = "\
4. IMPORTANT: In every table, at least 2 rows must contain realistic outlier values. Outliers should be \
values that are plausible but unusual or erroneous for the column, such as:
   - Numeric values just outside the normal range (negative sales, extremely high prices, durations of 0 or 9999 seconds)
   - Typos, truncated or excessively long strings in text fields (\"Taylr Swft\", \"aaaaaaaaaaaaaaaaaaaaaaaa\")
   - Unexpected but possible values in categorical fields (\"XX\" for country, \"Unknown\" for genre)
   - Dates that are plausible but odd (1900-01-01, 2099-12-31, or swapped month/day)
   - Duplicated or missing values in non-primary key fields
5. In every table, at least 2 rows must contain NULL values in columns where NULLs are allowed.
6. The rest of the data should be plausible and typical for the domain.
7. Do not use placeholder names like \"Outlier1\". Make outliers look like real-world data errors or rare cases.
";

const IDEAL_RULES: &str = "\
4. Every value must be valid for its column: no NULLs, no typos, no placeholder values, no out-of-range numbers or dates.
5. Keys must be consistent across tables.
";

/// Build the generation prompt for an industry and sub-domain.
pub fn build_generation_prompt(mode: GenerationMode, industry: &str, subdomain: &str) -> String {
    let rules = match mode {
        GenerationMode::Ideal => IDEAL_RULES,
        GenerationMode::WithErrors => ERROR_RULES,
    };

    format!(
        "You are an expert SQL database designer and data generator.\n\n\
         Generate a realistic SQL database for the '{industry}' industry focusing on the '{subdomain}' sub-domain:\n\
         1. At least 7 well-structured CREATE TABLE statements.\n\
         2. INSERT INTO statements with at least 7 rows per table, written as \
         INSERT INTO table (col, ...) VALUES (...), (...);\n\
         3. All values must look realistic and relevant to the industry and sub-domain.\n\
         {rules}\n\
         Strict formatting rules:\n\
         - Do not use markdown formatting (no triple backticks).\n\
         - Do not include explanations or prefaces.\n\
         - Return only the raw SQL."
    )
}

/// Strip markdown fences and a leading `Final Answer:` marker from a reply.
pub fn clean_sql_output(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(idx) = text.find("Final Answer:") {
        text = text[idx + "Final Answer:".len()..].trim();
    }

    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Generates synthetic SQL for a data directory and converts it to CSV files.
pub struct SqlGenerator<'a> {
    provider: &'a dyn AIProvider,
    dir: PathBuf,
    mode: GenerationMode,
}

impl<'a> SqlGenerator<'a> {
    pub fn new(provider: &'a dyn AIProvider, dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            dir: dir.into(),
            mode: GenerationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the directory's data files with freshly generated ones.
    ///
    /// Both inputs are validated before anything is deleted. Existing `.csv`
    /// and `.sql` files are then removed, the reply is cleaned, converted to
    /// CSV files and saved as [`SQL_FILE_NAME`].
    pub fn generate(&self, industry: &str, subdomain: &str) -> Result<GeneratedData> {
        let industry = industry.trim();
        let subdomain = subdomain.trim();
        if industry.is_empty() {
            return Err(DataverseError::InvalidInput(
                "Industry cannot be empty".to_string(),
            ));
        }
        if subdomain.is_empty() {
            return Err(DataverseError::InvalidInput(
                "Sub-domain cannot be empty".to_string(),
            ));
        }

        std::fs::create_dir_all(&self.dir)
            .context(format!("Failed to create directory '{}'", self.dir.display()))?;
        let cleared = clear_data_files(&self.dir)?;
        debug!("Cleared {} data files from {}", cleared, self.dir.display());

        info!(
            "Generating {:?} data for {} / {}",
            self.mode, industry, subdomain
        );
        let prompt = build_generation_prompt(self.mode, industry, subdomain);
        let sql = clean_sql_output(&complete_with(self.provider, &prompt)?);

        let tables = sql_to_csv(&sql, &self.dir)?;
        let sql_path = self.dir.join(SQL_FILE_NAME);
        std::fs::write(&sql_path, &sql)
            .context(format!("Failed to write '{}'", sql_path.display()))?;

        Ok(GeneratedData { sql, tables })
    }
}

/// Delete every `.csv` and `.sql` file of `dir`, best-effort.
///
/// Returns how many files are gone afterwards.
fn clear_data_files(dir: &Path) -> Result<usize> {
    let mut cleared = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if (has_csv_extension(&name) || name.to_lowercase().ends_with(".sql"))
            && remove_file_best_effort(&entry.path())
        {
            cleared += 1;
        }
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct Recording {
        reply: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl AIProvider for Recording {
        fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &str {
            "Recording"
        }
    }

    #[test]
    fn test_clean_sql_output() {
        let raw = "Thought: done\nFinal Answer:\n```sql\nINSERT INTO t (a) VALUES (1);\n```\n";
        assert_eq!(clean_sql_output(raw), "INSERT INTO t (a) VALUES (1);");
        assert_eq!(clean_sql_output("  SELECT 1;  "), "SELECT 1;");
    }

    #[test]
    fn test_prompts_differ_by_mode() {
        let ideal = build_generation_prompt(GenerationMode::Ideal, "Retail", "Grocery");
        let errors = build_generation_prompt(GenerationMode::WithErrors, "Retail", "Grocery");

        assert!(ideal.contains("'Retail' industry"));
        assert!(ideal.contains("no NULLs"));
        assert!(errors.contains("outlier values"));
        assert!(!errors.contains("no NULLs"));
    }

    #[test]
    fn test_generate_replaces_data_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.csv"), "x\n1\n").unwrap();
        std::fs::write(dir.path().join("old.sql"), "SELECT 1;").unwrap();
        std::fs::write(dir.path().join("keep.txt"), "notes").unwrap();

        let provider = Recording::new(
            "```sql\nINSERT INTO Songs (id, title) VALUES (1, 'Intro'), (2, NULL);\n```",
        );
        let generated = SqlGenerator::new(&provider, dir.path())
            .with_mode(GenerationMode::WithErrors)
            .generate("Music", "Streaming")
            .unwrap();

        assert_eq!(generated.tables, vec!["songs_data.csv"]);
        assert!(!generated.sql.contains("```"));
        assert!(!dir.path().join("old.csv").exists());
        assert!(!dir.path().join("old.sql").exists());
        assert!(dir.path().join("keep.txt").exists());
        assert!(dir.path().join("songs_data.csv").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(SQL_FILE_NAME)).unwrap(),
            generated.sql
        );
        assert!(provider.prompts.lock().unwrap()[0].contains("'Streaming' sub-domain"));
    }

    #[test]
    fn test_generate_validates_before_clearing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.csv"), "x\n1\n").unwrap();
        let provider = Recording::new("");

        let err = SqlGenerator::new(&provider, dir.path())
            .generate("Music", "   ")
            .unwrap_err();

        assert!(err.is_input_error());
        assert!(dir.path().join("old.csv").exists());
        assert!(provider.prompts.lock().unwrap().is_empty());
    }
}
