//! CLI entry point for the basic cleaning stage.

use anyhow::{Context, Result, anyhow};
use basic_cleaning::{
    ArtifactSpec, CleaningConfig, CleaningError, DEFAULT_OUTPUT_FILE, LocalArtifactStore,
    Pipeline, RunReport,
};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Exit status for runs rejected because of the dataset itself (EX_DATAERR).
const EXIT_INPUT_ERROR: u8 = 65;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Basic cleaning of the NYC rental listings dataset",
    long_about = "Fetches a raw listings artifact, keeps rows with a price in \
                  [min_price, max_price] inside the New York City bounding box, \
                  converts last_review to dates and publishes the result as a new artifact.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  ARTIFACT_ROOT    Root directory of the local artifact store\n  \
                  RUST_LOG         Overrides --log-level\n\n\
                  EXAMPLE:\n  \
                  basic-cleaning --input_artifact sample.csv:latest \\\n    \
                  --output_artifact clean_sample.csv --output_type clean_sample \\\n    \
                  --output_description 'Data with outliers and null values removed' \\\n    \
                  --min_price 10 --max_price 350",
    allow_negative_numbers = true
)]
struct Args {
    /// Fully-qualified name of the input artifact (e.g. sample.csv:latest)
    #[arg(long, alias = "input_artifact")]
    input_artifact: String,

    /// Name of the output artifact
    #[arg(long, alias = "output_artifact")]
    output_artifact: String,

    /// Type of the output artifact
    #[arg(long, alias = "output_type")]
    output_type: String,

    /// Description of the output artifact
    #[arg(long, alias = "output_description")]
    output_description: String,

    /// Lowest price to keep (inclusive)
    #[arg(long, alias = "min_price")]
    min_price: f64,

    /// Highest price to keep (inclusive)
    #[arg(long, alias = "max_price")]
    max_price: f64,

    /// Root directory of the local artifact store
    #[arg(long, env = "ARTIFACT_ROOT", default_value = "./artifacts")]
    artifact_root: PathBuf,

    /// Local file the cleaned dataset is written to before publishing
    #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
    output_file: PathBuf,

    /// Apply the geography filter a second time after date conversion
    #[arg(long)]
    legacy_geo_refilter: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the final run report (or error) is printed.
    #[arg(long)]
    json: bool,
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

/// Map a failed run to the process exit status.
///
/// Missing columns and malformed values exit with [`EXIT_INPUT_ERROR`] so a
/// caller can tell a bad dataset from a broken environment (exit 1).
fn exit_code(err: &CleaningError) -> u8 {
    if err.is_input_error() {
        EXIT_INPUT_ERROR
    } else {
        1
    }
}

fn main() -> Result<ExitCode> {
    // .env must be loaded before clap resolves env-backed flags
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let pipeline = build_pipeline(&args)?;
    let output = ArtifactSpec::new(
        &args.output_artifact,
        &args.output_type,
        &args.output_description,
    );

    match pipeline.run(&args.input_artifact, &output) {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_human_readable_summary(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            } else {
                eprintln!("Error: {}", e.root());
            }
            error!("Basic cleaning failed [{}]: {}", e.error_code(), e);
            Ok(ExitCode::from(exit_code(&e)))
        }
    }
}

/// Split `--output-file` into the directory the pipeline writes to and the
/// bare file name it publishes.
fn split_output_file(path: &std::path::Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid output file: {}", path.display()))?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

fn build_pipeline(args: &Args) -> Result<Pipeline> {
    let (work_dir, file_name) = split_output_file(&args.output_file)?;

    let config = CleaningConfig::builder()
        .min_price(args.min_price)
        .max_price(args.max_price)
        .legacy_geo_refilter(args.legacy_geo_refilter)
        .output_file(file_name)
        .build()
        .context("Invalid cleaning parameters")?;

    info!(
        "Using artifact store at {} (prices [{}, {}])",
        args.artifact_root.display(),
        config.min_price,
        config.max_price
    );

    let mut builder = Pipeline::builder()
        .config(config)
        .store(Arc::new(LocalArtifactStore::new(&args.artifact_root)))
        .work_dir(work_dir);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the command's result, not a log line.
fn print_human_readable_summary(report: &RunReport) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("BASIC CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input:  {} ({})",
        report.input_artifact,
        report.input_path.display()
    );
    println!(
        "Output: {} [{}] ({})",
        report.artifact.qualified_name(),
        report.artifact.artifact_type,
        report.output_file.display()
    );
    println!();
    println!("Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed()
    );
    println!("  Removed by price: {}", summary.removed_by_price);
    println!("  Removed by geography: {}", summary.removed_by_geography);
    println!("  Null last_review: {}", summary.null_dates);
    println!();

    if !summary.steps.is_empty() {
        println!("Steps:");
        for step in &summary.steps {
            println!("  - {}", step);
        }
        println!();
    }

    if !summary.date_warnings.is_empty() {
        println!("Warnings:");
        for warning in summary.date_warnings.iter().take(10) {
            println!("  ! {}", warning);
        }
        if summary.date_warnings.len() > 10 {
            println!("  ... and {} more", summary.date_warnings.len() - 10);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 13] = [
        "basic-cleaning",
        "--input_artifact",
        "sample.csv:latest",
        "--output_artifact",
        "clean_sample.csv",
        "--output_type",
        "clean_sample",
        "--output_description",
        "Data with outliers removed",
        "--min_price",
        "10",
        "--max_price",
        "350",
    ];

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_underscore_aliases() {
        let args = Args::try_parse_from(REQUIRED).unwrap();
        assert_eq!(args.input_artifact, "sample.csv:latest");
        assert_eq!(args.min_price, 10.0);
        assert_eq!(args.max_price, 350.0);
        assert_eq!(args.output_file, PathBuf::from("clean_sample.csv"));
        assert!(!args.legacy_geo_refilter);
    }

    #[test]
    fn test_missing_required_argument() {
        let err = Args::try_parse_from(&REQUIRED[..11]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_negative_price_is_accepted() {
        let mut argv = REQUIRED.to_vec();
        argv[10] = "-5";
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.min_price, -5.0);
    }

    #[test]
    fn test_exit_code_for_input_errors() {
        let missing = CleaningError::MissingColumn(vec!["latitude".to_string()])
            .with_context("Cleaning dataset");
        assert_eq!(exit_code(&missing), EXIT_INPUT_ERROR);

        let malformed =
            CleaningError::MalformedInput("column 'price': 'cheap' is not a number".to_string());
        assert_eq!(exit_code(&malformed), EXIT_INPUT_ERROR);
    }

    #[test]
    fn test_exit_code_for_environment_errors() {
        let not_found = CleaningError::ArtifactNotFound("sample.csv:latest".to_string())
            .with_context("Fetching input artifact");
        assert_eq!(exit_code(&not_found), 1);
        assert_eq!(exit_code(&CleaningError::Usage("bad".to_string())), 1);
    }

    #[test]
    fn test_split_output_file() {
        let (dir, name) = split_output_file(std::path::Path::new("clean_sample.csv")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "clean_sample.csv");

        let (dir, name) = split_output_file(std::path::Path::new("out/clean.csv")).unwrap();
        assert_eq!(dir, PathBuf::from("out"));
        assert_eq!(name, "clean.csv");
    }
}
