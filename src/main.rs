//! Command-line entry point for logslice.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use logslice::extract::ExtractConfig;
use logslice::zip::EntrySelector;
use logslice::{
    ArchiveSource, Cli, HttpRangeReader, LocalFileReader, Outcome, ReadAt, TraceObserver, ZipExtractor,
    extract_date,
};

/// Parses arguments, validates them, then runs a single extraction on a
/// current-thread runtime: every step is awaited in order.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    // Listing needs no date; extraction is fully validated up front.
    let config = if cli.list { None } else { Some(cli.config()?) };

    match cli.archive_source()? {
        ArchiveSource::Remote(url) => {
            let reader = Arc::new(HttpRangeReader::new(url).await?);
            run(reader.clone(), &cli, config.as_ref()).await?;

            if !cli.quiet {
                eprintln!("Total bytes transferred: {}", format_size(reader.transferred_bytes()));
            }
        }
        ArchiveSource::Local(path) => {
            let reader = Arc::new(LocalFileReader::new(&path)?);
            run(reader, &cli, config.as_ref()).await?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` enables the search trace.
fn init_tracing(cli: &Cli) {
    let default = match cli.verbose {
        0 => "logslice=warn",
        1 => "logslice=debug",
        _ => "logslice=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli, config: Option<&ExtractConfig>) -> Result<()> {
    let Some(config) = config else {
        return list_entries(reader, &cli.selector()).await;
    };

    let outcome = extract_date(reader, config, &mut TraceObserver).await?;
    if cli.quiet {
        return Ok(());
    }

    match outcome {
        Outcome::NoLogFile => println!("No log files found in the zip archive."),
        Outcome::DateNotFound { entry } => {
            println!("No logs found for date {} in {}", config.date, entry)
        }
        Outcome::Extracted { entry, summary } => {
            println!(
                "Logs for {} have been extracted to {} ({} lines, {} from {})",
                config.date,
                config.output.display(),
                summary.lines,
                format_size(summary.bytes),
                entry
            );
        }
    }

    Ok(())
}

/// Print the entries the selector accepts; the first one is searched.
async fn list_entries<R: ReadAt + 'static>(reader: Arc<R>, selector: &EntrySelector) -> Result<()> {
    let extractor = ZipExtractor::new(reader);
    let entries = extractor.log_entries(selector).await?;

    if entries.is_empty() {
        println!("No log files found in the zip archive.");
        return Ok(());
    }

    println!("{:>12}  {:>12}  {:>16}  Name", "Length", "Size", "Modified");
    println!("{}", "-".repeat(60));
    for (i, entry) in entries.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!(
            "{:>12}  {:>12}  {:>16} {}{}",
            entry.uncompressed_size,
            entry.compressed_size,
            entry.modified(),
            marker,
            entry.file_name
        );
    }

    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
