//! CLI entry point for the CSV cleaning client.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use lex_cleaner::{
    AuthPlacement, CleanerError, CleaningOperations, CleaningSession, ClientConfig, FileUpload,
    PreviewTable, ProcessReport, SaveToDirectory, Severity, StatusMessage, UploadedFile,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// CLI-compatible credential placement enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAuthPlacement {
    /// Authorization: Bearer header only
    Header,
    /// scheme/credentials fields in the request body only
    Body,
    /// Both header and body fields
    Both,
}

impl From<CliAuthPlacement> for AuthPlacement {
    fn from(cli: CliAuthPlacement) -> Self {
        match cli {
            CliAuthPlacement::Header => AuthPlacement::Header,
            CliAuthPlacement::Body => AuthPlacement::Body,
            CliAuthPlacement::Both => AuthPlacement::HeaderAndBody,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Client for the remote CSV cleaning service",
    long_about = "Uploads a CSV file to the cleaning service, previews it, and optionally \
                  downloads a cleaned copy.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LEX_CLEANER_BASE_URL       Service address (default http://localhost:8000)\n  \
                  LEX_CLEANER_API_KEY        Credential (default demo-key)\n  \
                  LEX_CLEANER_TIMEOUT_SECS   Request timeout in seconds\n\n\
                  EXAMPLES:\n  \
                  # Upload and preview only\n  \
                  lex-cleaner data.csv\n\n  \
                  # Remove rows with missing values and duplicates\n  \
                  lex-cleaner data.csv --remove-missing --remove-duplicates -o cleaned/\n\n  \
                  # Only consider some columns, print the download link\n  \
                  lex-cleaner data.csv --remove-missing --column age --column fare --no-download"
)]
struct Args {
    /// Path to the CSV file to upload
    input: String,

    /// Remove rows with missing values
    #[arg(long)]
    remove_missing: bool,

    /// Remove duplicate rows
    #[arg(long)]
    remove_duplicates: bool,

    /// Restrict cleaning to this column (repeatable; default: all columns)
    #[arg(long = "column", value_name = "NAME")]
    columns: Vec<String>,

    /// Service base URL (overrides LEX_CLEANER_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Credential (overrides LEX_CLEANER_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Where the credential is sent
    #[arg(long, value_enum, default_value = "both")]
    auth: CliAuthPlacement,

    /// Output directory for the cleaned file
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Print the download URL instead of saving the cleaned file
    #[arg(long)]
    no_download: bool,

    /// Request timeout in seconds (overrides LEX_CLEANER_TIMEOUT_SECS)
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum characters per preview cell
    #[arg(long, default_value = "50")]
    cell_limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Machine-readable result printed with `--json`.
#[derive(Serialize)]
struct RunReport<'a> {
    status: Option<&'a StatusMessage>,
    file: Option<&'a UploadedFile>,
    preview: Option<&'a PreviewTable>,
    processed: Option<&'a ProcessReport>,
    /// Path or URL of the cleaned file.
    location: Option<String>,
    error: Option<&'a CleanerError>,
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

fn build_config(args: &Args) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder_from_env()
        .auth_placement(args.auth.into())
        .preview_cell_limit(args.cell_limit);

    if let Some(url) = &args.base_url {
        builder = builder.base_url(url);
    }
    if let Some(key) = &args.api_key {
        builder = builder.api_key(key);
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout_secs(secs);
    }

    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let input = Path::new(&args.input);
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;
    debug!(base_url = %config.base_url, auth = ?config.auth_placement, "configuration loaded");

    let mut session = CleaningSession::from_config(config)?;
    if !args.no_download {
        session = session.with_opener(SaveToDirectory::new(&args.output));
    }

    info!("Reading file: {}", args.input);
    let upload = FileUpload::from_path(input).await?;
    let uploaded = session.select_file(upload).await;

    let operations = CleaningOperations::new(args.remove_missing, args.remove_duplicates)
        .with_columns(args.columns.clone());

    let processed = match &uploaded {
        Ok(_) if operations.has_any() => Some(session.process(operations).await),
        Ok(_) => {
            info!("No cleaning operation selected; stopping after preview");
            None
        }
        Err(_) => None,
    };

    let error = match (&uploaded, &processed) {
        (Err(e), _) | (_, Some(Err(e))) => Some(e),
        _ => None,
    };
    let report = processed.as_ref().and_then(|r| r.as_ref().ok());

    if args.json {
        let run = RunReport {
            status: session.status(),
            file: uploaded.as_ref().ok(),
            preview: session.preview_table(),
            processed: report,
            location: report.and_then(|r| r.opened.as_ref()).map(ToString::to_string),
            error,
        };
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&session, uploaded.as_ref().ok(), report);
    }

    match session.status() {
        Some(status) if status.severity == Severity::Error => Err(anyhow!("{}", status.text)),
        _ => match error {
            Some(e) if !e.is_client_side() => Err(anyhow!("{}", e.user_message())),
            _ => Ok(()),
        },
    }
}

/// Print a human-readable summary.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn print_summary(
    session: &CleaningSession,
    file: Option<&UploadedFile>,
    report: Option<&ProcessReport>,
) {
    println!();
    if let Some(status) = session.status() {
        println!("{}", status);
    }

    if let Some(file) = file {
        println!();
        println!("FILE");
        println!("{}", "-".repeat(40));
        println!("  Name: {}", file.name);
        println!("  Id: {}", file.file_id);
        println!("  Rows: {}", file.rows);
        println!("  Columns: {}", file.columns);
        if let Some(size) = file.size_bytes {
            println!("  Size: {} bytes", size);
        }
    }

    if let Some(table) = session.preview_table() {
        println!();
        println!("PREVIEW ({} rows)", table.row_count());
        println!("{}", "-".repeat(40));
        print!("{}", table.to_text());
    }

    if let Some(report) = report {
        println!();
        println!("CLEANED FILE");
        println!("{}", "-".repeat(40));
        if let Some(rows) = report.artifact.rows {
            println!("  Rows: {}", rows);
        }
        if let Some(columns) = report.artifact.columns {
            println!("  Columns: {}", columns);
        }
        match &report.opened {
            Some(opened) => println!("  Location: {}", opened),
            None => println!("  Download URL: {}", report.artifact.download_url),
        }
    }
    println!();
}
