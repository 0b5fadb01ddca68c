use anyhow::{Context, Result};
use clap::Parser;
use contact_import::preview::DEFAULT_PAYLOAD_FILE;
use contact_import::{
    build_preview, existing_from_strings, render_summary, write_payload, ImportOptions,
    TableReader, DEFAULT_IMPORT_LIMIT,
};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "import-preview",
    about = "Preview a contact upload: normalize, dedupe and cap the numbers in one column"
)]
struct Cli {
    /// CSV, XLSX or XLS file to read (first sheet only)
    file: PathBuf,

    /// Zero-based column holding the phone numbers
    #[arg(long, default_value_t = 0)]
    column: usize,

    /// Maximum number of valid numbers to keep
    #[arg(long, default_value_t = DEFAULT_IMPORT_LIMIT)]
    limit: usize,

    /// Category id to carry in the exported payload
    #[arg(long)]
    category: Option<String>,

    /// File with numbers already known, one per line
    #[arg(long, value_name = "PATH")]
    existing: Option<PathBuf>,

    /// Field delimiter; detected from the first line when omitted
    #[arg(long)]
    delimiter: Option<char>,

    /// Keep classifying rows after the limit is reached instead of stopping
    #[arg(long)]
    classify_remaining: bool,

    /// Write the `{ category, numbers }` payload here
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_PAYLOAD_FILE)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let reader = match cli.delimiter {
        Some(d) if d.is_ascii() => TableReader::with_delimiter(d as u8),
        Some(d) => anyhow::bail!("Delimiter must be a single ASCII character, got {:?}", d),
        None => TableReader::new(),
    };

    let rows = reader
        .read_path(&cli.file)
        .with_context(|| format!("Failed to read {:?}", cli.file))?;

    let existing = match &cli.existing {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read existing numbers from {:?}", path))?;
            existing_from_strings(content.lines())
        }
        None => HashSet::new(),
    };

    let mut options = ImportOptions::with_limit(cli.limit);
    if cli.classify_remaining {
        options = options.classify_remaining();
    }

    tracing::debug!(
        rows = rows.len(),
        existing = existing.len(),
        column = cli.column,
        "Running import preview"
    );

    let preview = build_preview(&rows, cli.column, &existing, cli.category, options);
    println!("{}", render_summary(&preview));

    if let Some(path) = cli.export {
        write_payload(&preview.payload, &path)
            .with_context(|| format!("Failed to write payload to {:?}", path))?;
        println!("Payload with {} numbers written to {}", preview.payload.numbers.len(), path.display());
    }

    Ok(())
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn init_tracing() {
    let env_filter = env_filter();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
