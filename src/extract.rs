//! One extraction: pick the log entry, locate the date, copy its lines.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::io::ReadAt;
use crate::search::{DateKey, Location, OffsetLocator, RangeExtractor, ScanSummary, SearchObserver};
use crate::zip::{EntrySelector, ZipExtractor};

/// Where the archive comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(String),
}

/// Validated inputs of an extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub archive: ArchiveSource,
    pub date: DateKey,
    pub output: PathBuf,
    pub selector: EntrySelector,
    pub chunk_size: usize,
}

/// How an extraction ended, short of a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The date's lines were written to the output file
    Extracted { entry: String, summary: ScanSummary },
    /// The archive has no entry matching the selector; nothing was written
    NoLogFile,
    /// The entry holds no line for the date; the output file is empty
    DateNotFound { entry: String },
}

/// Default output path for a date: `output_logs/output_<date>.txt`
pub fn default_output(date: &DateKey) -> PathBuf {
    PathBuf::from("output_logs").join(format!("output_{date}.txt"))
}

/// Create missing parent directories and remove a previous output file.
pub async fn prepare_output(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("cannot create directory {}", parent.display()))?;
        }
    }

    match fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed previous output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

/// Run an extraction against an already opened archive.
pub async fn extract_date<R, O>(reader: Arc<R>, config: &ExtractConfig, observer: &mut O) -> Result<Outcome>
where
    R: ReadAt,
    O: SearchObserver + ?Sized,
{
    let locator = OffsetLocator::new(config.chunk_size)?;
    prepare_output(&config.output).await?;

    let extractor = ZipExtractor::new(reader);
    let Some(entry) = extractor.select_entry(&config.selector).await? else {
        return Ok(Outcome::NoLogFile);
    };
    let mut stream = extractor.open_stream(&entry).await?;

    let file = fs::File::create(&config.output)
        .await
        .with_context(|| format!("cannot create {}", config.output.display()))?;
    let mut sink = BufWriter::new(file);

    let start = match locator.locate(&mut stream, &config.date, observer).await? {
        Location::Found(offset) => offset,
        Location::NotFound => {
            sink.shutdown().await?;
            return Ok(Outcome::DateNotFound {
                entry: entry.file_name,
            });
        }
    };
    tracing::debug!(entry = %entry.file_name, start, "date located");

    let summary = RangeExtractor::new(config.chunk_size)
        .extract(&mut stream, start, &config.date, &mut sink)
        .await
        .with_context(|| format!("extracting into {}", config.output.display()))?;
    sink.shutdown().await?;

    Ok(Outcome::Extracted {
        entry: entry.file_name,
        summary,
    })
}
