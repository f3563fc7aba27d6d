//! CLI entry point for the EHR data quality audit.

use anyhow::{Result, anyhow};
use clap::Parser;
use ehr_audit::reporting::{DETAILED_REPORT, ERROR_LOG_REPORT, SUMMARY_REPORT};
use ehr_audit::{AuditConfig, AuditPipeline, OverallMetrics, ReportGenerator};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "EHR Data Quality Audit Pipeline",
    long_about = "Audits tabular clinical records for missing values, outliers,\n\
                  multivariate anomalies, range violations, and format errors,\n\
                  then scores every record and writes detailed reports.\n\n\
                  EXAMPLES:\n  \
                  # Audit with the built-in defaults\n  \
                  ehr-audit -i ehr.csv\n\n  \
                  # Audit with a settings file and custom output directory\n  \
                  ehr-audit -i ehr.csv --config audit.json -o reports/\n\n  \
                  # Machine-readable metrics for piping\n  \
                  ehr-audit -i ehr.csv --json | jq .overall_metrics"
)]
struct Args {
    /// Path to the CSV file to audit
    #[arg(short, long)]
    input: String,

    /// Path to a JSON settings file
    ///
    /// Missing keys fall back to the built-in defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Output directory for the report files
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON metrics
    #[arg(long)]
    json: bool,

    /// Override the isolation forest seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the expected anomalous fraction, in (0, 0.5)
    #[arg(long)]
    contamination: Option<f64>,
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
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !std::path::Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = load_config(&args)?;

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());
    let shape = data.shape();

    let pipeline = AuditPipeline::new(config)?;
    let outcome = match pipeline.run(data) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Audit failed: {}", e);
            return Err(anyhow!("Audit failed: {}", e));
        }
    };

    let generator = ReportGenerator::new(&args.output);
    let metrics = generator.generate(&outcome)?;

    if args.json {
        let report = json!({
            "input_file": args.input,
            "records": shape.0,
            "fields": shape.1,
            "flag_columns": outcome.registry.names(),
            "overall_metrics": metrics,
            "reports": {
                "detailed": format!("{}/{}", args.output, DETAILED_REPORT),
                "error_log": format!("{}/{}", args.output, ERROR_LOG_REPORT),
                "summary": format!("{}/{}", args.output, SUMMARY_REPORT),
            },
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&args, shape, &outcome.registry.names(), &metrics);
    Ok(())
}

/// Load the audit configuration, applying CLI overrides.
fn load_config(args: &Args) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow!("Could not read settings file '{}': {}", path, e))?;
            serde_json::from_str(&content)
                .map_err(|e| anyhow!("Invalid settings file '{}': {}", path, e))?
        }
        None => {
            debug!("No settings file given, using built-in defaults");
            AuditConfig::default()
        }
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(contamination) = args.contamination {
        config.contamination = contamination;
    }

    config.validate().map_err(|e| anyhow!("{}", e))?;
    Ok(config)
}

/// Load a CSV file with multiple fallback strategies.
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Loading without quotes failed: {}", e);
        }
    }

    // Strategy 3: Pre-clean content
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cleaned = clean_csv_content(&content);
            use std::io::Cursor;
            let cursor = Cursor::new(cleaned);

            CsvReadOptions::default()
                .with_infer_schema_length(Some(100))
                .with_has_header(true)
                .into_reader_with_file_handle(cursor)
                .finish()
                .map_err(|e| e.into())
        }
        Err(e) => {
            error!("Could not read file: {}", e);
            Err(e.into())
        }
    }
}

/// Strip stray quoting and blank lines from malformed exports.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print a human-readable summary of the audit results.
///
/// This uses `println!` intentionally for user-facing CLI output; unlike the
/// progress logs it should always be visible.
fn print_human_readable_summary(
    args: &Args,
    shape: (usize, usize),
    flag_columns: &[String],
    metrics: &OverallMetrics,
) {
    println!();
    println!("{}", "=".repeat(80));
    println!("AUDIT COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:   {} ({} records x {} fields)",
        args.input, shape.0, shape.1
    );
    println!("Reports: {}", args.output);
    println!("  - {}", DETAILED_REPORT);
    println!("  - {}", ERROR_LOG_REPORT);
    println!("  - {}", SUMMARY_REPORT);
    println!();

    println!("Flag columns produced: {}", flag_columns.len());
    for name in flag_columns {
        println!("  - {}", name);
    }
    println!();

    println!("Overall Quality Metrics:");
    println!("  Total records:            {}", metrics.total_records);
    println!(
        "  Average quality score:    {}%",
        metrics.average_quality_score
    );
    println!(
        "  Records without errors:   {}",
        metrics.records_without_errors
    );
    println!(
        "  Records below 50% quality: {}",
        metrics.records_below_half_quality
    );
    println!(
        "  Average completeness:     {}%",
        metrics.average_completeness_score
    );
    println!();
    println!("{}", "=".repeat(80));
}
