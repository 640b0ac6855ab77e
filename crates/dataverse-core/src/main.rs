//! CLI entry point for the DataVerse service.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use dataverse_core::config::{DATA_DIR_ENV, DEFAULT_DATA_DIR};
use dataverse_core::utils::merged_file_path;
use dataverse_core::{
    ColumnOutliers, DataverseConfig, DataverseError, DataverseService, FileAnalysis,
    GenerationMode, LineStatus,
};
use dotenv::dotenv;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[cfg(feature = "ai")]
use dataverse_core::ai::OpenRouterProvider;
#[cfg(feature = "ai")]
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    author = "DataVerse Team",
    version,
    about = "Data-quality analysis, merging and reduction for synthetic CSV datasets",
    long_about = "Analyze, merge, reduce and edit the CSV files of one data directory.\n\n\
                  The directory's files are merged into __merged_all_data.csv when the\n\
                  command starts; the artifact is removed on exit unless --keep-merged.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  OPENROUTER_API_KEY    API key for OpenRouter (required for AI commands)\n  \
                  DATAVERSE_MODEL       Override the OpenRouter model\n  \
                  DATAVERSE_DATA_DIR    Default data directory\n\n\
                  EXAMPLES:\n  \
                  # Data quality report of every CSV file\n  \
                  dataverse analyze\n\n  \
                  # Generate erroneous synthetic data, then keep the 3 most relevant files\n  \
                  dataverse generate --industry Retail --subdomain Sales\n  \
                  dataverse reduce --keep 3\n\n  \
                  # Missing values of the merged table, as JSON\n  \
                  dataverse --json missing"
)]
struct Args {
    /// Directory holding the CSV files
    #[arg(short, long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the result (or the error) is printed.
    #[arg(long)]
    json: bool,

    /// Keep the merged artifact on exit
    #[arg(long)]
    keep_merged: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report missing values, outliers and suspicious values per CSV file
    Analyze,

    /// Merge every CSV file into the prefixed merged table
    Merge,

    /// Report missing values of the merged table grouped by source file
    Missing,

    /// Keep the N most relevant files and delete the others (AI)
    Reduce {
        /// Number of files to keep
        #[arg(short, long)]
        keep: usize,
    },

    /// Replace the directory's data with generated tables (AI)
    Generate {
        /// Industry, e.g. "Retail"
        #[arg(long)]
        industry: String,

        /// Sub-domain, e.g. "Sales"
        #[arg(long)]
        subdomain: String,

        /// Generate clean data instead of data seeded with errors
        #[arg(long)]
        ideal: bool,
    },

    /// Apply a natural-language instruction to one CSV file (AI)
    Modify {
        /// CSV file name inside the data directory
        #[arg(short, long)]
        file: String,

        /// What to change
        #[arg(short, long)]
        instruction: String,
    },

    /// Apply a file of `filename: instruction` lines (AI)
    ModifyBatch {
        /// Path to the instruction file
        file: PathBuf,
    },

    /// Ask a question about the merged table (AI)
    Ask {
        /// The question
        question: String,
    },

    /// Print the generated SQL script
    Sql,
}

impl Command {
    fn needs_ai(&self) -> bool {
        matches!(
            self,
            Command::Reduce { .. }
                | Command::Generate { .. }
                | Command::Modify { .. }
                | Command::ModifyBatch { .. }
                | Command::Ask { .. }
        )
    }

    /// Whether the command changes the data files, so the merged table must
    /// be rebuilt afterwards.
    fn changes_data(&self) -> bool {
        matches!(
            self,
            Command::Reduce { .. }
                | Command::Generate { .. }
                | Command::Modify { .. }
                | Command::ModifyBatch { .. }
        )
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load .env first so it can supply DATAVERSE_DATA_DIR to the parser
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = DataverseConfig::builder()
        .data_dir(&args.data_dir)
        .cleanup_on_shutdown(!args.keep_merged)
        .build()?;

    let mut builder = DataverseService::builder().config(config);
    if let Some(provider) = build_provider(&args.command) {
        builder = builder.ai_provider(provider);
    }

    let service = builder.start().map_err(|e| report_error(&e, args.json))?;
    info!("Data directory: {}", service.data_dir().display());

    let outcome = run_command(&service, &args);

    // Teardown runs whatever the command's outcome
    if service.shutdown() {
        debug!("Merged artifact removed");
    }

    outcome.map_err(|e| report_error(&e, args.json))
}

/// Build the AI provider from the environment.
#[cfg(feature = "ai")]
fn build_provider(command: &Command) -> Option<Arc<dyn dataverse_core::ai::AIProvider>> {
    match OpenRouterProvider::from_env() {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            if command.needs_ai() {
                warn!("{}. AI-backed commands are unavailable.", e);
            }
            None
        }
    }
}

/// AI support is not compiled in (fallback when "ai" feature is disabled)
#[cfg(not(feature = "ai"))]
fn build_provider(command: &Command) -> Option<std::sync::Arc<dyn dataverse_core::ai::AIProvider>> {
    if command.needs_ai() {
        warn!("AI support not compiled in. AI-backed commands are unavailable.");
        warn!("Compile with --features ai to enable AI support.");
    }
    None
}

/// Print a failed command's error and turn it into the process error.
fn report_error(e: &DataverseError, json: bool) -> anyhow::Error {
    if json {
        match serde_json::to_string_pretty(e) {
            Ok(body) => println!("{}", body),
            Err(ser) => error!("Could not serialize error: {}", ser),
        }
    } else {
        error!("{}", e);
        if let Some(raw) = e.raw_response() {
            error!("Raw response: {}", raw);
        }
    }
    anyhow!("{} ({})", e, e.error_code())
}

fn run_command(service: &DataverseService, args: &Args) -> dataverse_core::DataverseResult<()> {
    let json = args.json;

    match &args.command {
        Command::Analyze => {
            let analyses = service.analyze_errors()?;
            emit(json, &analyses, |a| print_analyses(a))?;
        }
        Command::Merge => {
            let summary = match service.merged_table() {
                Some(df) => MergeSummary {
                    merged_file: Some(merged_file_path(service.data_dir())),
                    rows: df.height(),
                    columns: df.width(),
                },
                None => MergeSummary {
                    merged_file: None,
                    rows: 0,
                    columns: 0,
                },
            };
            emit(json, &summary, |s| match &s.merged_file {
                Some(path) => println!(
                    "Merged {} rows x {} columns into {}",
                    s.rows,
                    s.columns,
                    path.display()
                ),
                None => println!("No CSV data to merge"),
            })?;
        }
        Command::Missing => {
            let missing = service.missing_values()?;
            emit(json, &missing, |report| {
                if report.is_empty() {
                    println!("No missing values");
                }
                for (prefix, counts) in report {
                    println!("{}:", prefix);
                    for (column, count) in counts {
                        println!("  {}: {}", column, count);
                    }
                }
            })?;
        }
        Command::Reduce { keep } => {
            let outcome = service.reduce_files(*keep)?;
            emit(json, &outcome, |o| {
                println!("Kept:    {}", o.kept.join(", "));
                println!("Removed: {}", o.removed.join(", "));
            })?;
        }
        Command::Generate {
            industry,
            subdomain,
            ideal,
        } => {
            let mode = if *ideal {
                GenerationMode::Ideal
            } else {
                GenerationMode::WithErrors
            };
            let generated = service.generate_data(industry, subdomain, mode)?;
            emit(json, &generated, |g| {
                println!("Generated {} tables:", g.tables.len());
                for table in &g.tables {
                    println!("  - {}", table);
                }
            })?;
        }
        Command::Modify { file, instruction } => {
            let outcome = service.modify_file(file, instruction)?;
            emit(json, &outcome, |o| println!("{}: {}", o.file_name, o.output))?;
        }
        Command::ModifyBatch { file } => {
            let results = service.modify_batch(file)?;
            emit(json, &results, |lines| {
                for r in lines {
                    let status = match r.status {
                        LineStatus::Success => "success",
                        LineStatus::Skipped => "skipped",
                        LineStatus::Warning => "warning",
                    };
                    let detail = r.output.as_deref().or(r.reason.as_deref()).unwrap_or("");
                    println!("[{}] line {}: {} -> {}", status, r.line, r.line_content, detail);
                }
            })?;
        }
        Command::Ask { question } => {
            let answer = service.ask_question(question)?;
            emit(json, &answer, |a| println!("{}", a.output))?;
        }
        Command::Sql => {
            let sql = service.sql_contents()?;
            emit(json, &SqlContents { sql }, |s| println!("{}", s.sql))?;
        }
    }

    if args.command.changes_data() {
        service.refresh()?;
    }
    Ok(())
}

#[derive(Serialize)]
struct MergeSummary {
    merged_file: Option<PathBuf>,
    rows: usize,
    columns: usize,
}

#[derive(Serialize)]
struct SqlContents {
    sql: String,
}

/// Print `value` as pretty JSON, or through `human` otherwise.
///
/// Note: this uses `println!` intentionally; the result is the command's
/// output and must be visible regardless of the log level.
fn emit<T: Serialize>(
    json: bool,
    value: &T,
    human: impl FnOnce(&T),
) -> dataverse_core::DataverseResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human(value);
    }
    Ok(())
}

fn print_analyses(analyses: &[FileAnalysis]) {
    if analyses.is_empty() {
        println!("No CSV files found");
        return;
    }

    println!("{}", "=".repeat(80));
    for analysis in analyses {
        let Some(report) = analysis.report() else {
            println!(
                "{}: could not be analyzed: {}",
                analysis.file_name(),
                analysis.error().unwrap_or_default()
            );
            println!("{}", "-".repeat(80));
            continue;
        };

        println!(
            "{} ({} rows x {} columns)",
            report.file_name, report.row_count, report.column_count
        );

        if report.missing_data.is_empty()
            && report.outliers.is_empty()
            && report.suspicious_values.is_empty()
        {
            println!("  No issues detected");
        }

        for (column, count) in &report.missing_data {
            println!("  missing   {:<24} {}", column, count);
        }
        for (column, outliers) in &report.outliers {
            let values = match outliers {
                ColumnOutliers::Numeric(values) => values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                ColumnOutliers::Dates(dates) => dates.join(", "),
            };
            println!("  outliers  {:<24} {}", column, values);
        }
        for (column, values) in &report.suspicious_values {
            let values = values
                .iter()
                .map(|v| v.as_deref().unwrap_or("null"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("  suspect   {:<24} {}", column, values);
        }
        println!("{}", "-".repeat(80));
    }
}
