use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};

use crate::extract::{ArchiveSource, ExtractConfig, default_output};
use crate::search::{DEFAULT_CHUNK_SIZE, DateKey, MIN_CHUNK_SIZE};
use crate::zip::EntrySelector;

#[derive(Parser, Debug)]
#[command(name = "logslice")]
#[command(version)]
#[command(about = "Extract one day of logs from a date-ordered log file inside a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  logslice logs_2024.log.zip 2024-12-01          write output_logs/output_2024-12-01.txt\n  \
  logslice logs.zip 2024-12-01 -o day.txt -v     trace the search while extracting\n  \
  logslice -l https://example.com/logs.zip       list candidate log entries")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Date to extract, as YYYY-MM-DD
    #[arg(value_name = "DATE", required_unless_present = "list")]
    pub date: Option<String>,

    /// Output file [default: output_logs/output_<DATE>.txt]
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Name suffix identifying log entries
    #[arg(short = 's', long = "suffix", value_name = "SUFFIX", default_value = ".log")]
    pub suffix: String,

    /// Exact entry name to search instead of the first suffix match
    #[arg(short = 'e', long = "entry", value_name = "NAME", conflicts_with = "suffix")]
    pub entry: Option<String>,

    /// Bytes read per probe and per scan step
    #[arg(short = 'c', long = "chunk-size", value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// List candidate log entries and exit
    #[arg(short = 'l')]
    pub list: bool,

    /// Trace the search (-vv for more)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no status messages
    #[arg(short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn selector(&self) -> EntrySelector {
        match &self.entry {
            Some(name) => EntrySelector::Name(name.clone()),
            None => EntrySelector::Suffix(self.suffix.clone()),
        }
    }

    /// Where the archive lives; a local path must name an existing file.
    pub fn archive_source(&self) -> Result<ArchiveSource> {
        if self.is_http_url() {
            return Ok(ArchiveSource::Remote(self.archive.clone()));
        }
        let path = Path::new(&self.archive);
        if !path.is_file() {
            bail!("archive {} does not exist or is not a file", path.display());
        }
        Ok(ArchiveSource::Local(path.to_path_buf()))
    }

    /// Validate the extraction arguments before any archive is opened.
    pub fn config(&self) -> Result<ExtractConfig> {
        let date = DateKey::parse(self.date.as_deref().context("a DATE is required to extract logs")?)?;

        if self.chunk_size < MIN_CHUNK_SIZE {
            bail!("--chunk-size must be at least {MIN_CHUNK_SIZE} bytes");
        }

        Ok(ExtractConfig {
            archive: self.archive_source()?,
            output: self.output.clone().unwrap_or_else(|| default_output(&date)),
            date,
            selector: self.selector(),
            chunk_size: self.chunk_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_date() {
        let cli = Cli::parse_from(["logslice", "https://example.com/a.zip", "2024-12-01"]);
        let config = cli.config().unwrap();
        assert_eq!(config.output, PathBuf::from("output_logs/output_2024-12-01.txt"));
        assert_eq!(config.selector, EntrySelector::Suffix(".log".into()));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.archive, ArchiveSource::Remote("https://example.com/a.zip".into()));
    }

    #[test]
    fn explicit_entry_wins() {
        let cli = Cli::parse_from(["logslice", "http://h/a.zip", "2024-12-01", "-e", "app/server.log"]);
        assert_eq!(cli.selector(), EntrySelector::Name("app/server.log".into()));
    }

    #[test]
    fn rejects_bad_input_up_front() {
        let bad_date = Cli::parse_from(["logslice", "http://h/a.zip", "12/01/2024"]);
        assert!(bad_date.config().is_err());

        let tiny = Cli::parse_from(["logslice", "http://h/a.zip", "2024-12-01", "-c", "8"]);
        assert!(tiny.config().is_err());

        let missing = Cli::parse_from(["logslice", "/definitely/not/here.zip", "2024-12-01"]);
        assert!(missing.config().is_err());
        assert!(missing.archive_source().is_err());
    }

    #[test]
    fn listing_needs_no_date() {
        let cli = Cli::try_parse_from(["logslice", "-l", "https://example.com/a.zip"]).unwrap();
        assert!(cli.list);
        assert_eq!(cli.date, None);
        assert_eq!(cli.archive_source().unwrap(), ArchiveSource::Remote("https://example.com/a.zip".into()));
        assert!(cli.config().is_err());

        assert!(Cli::try_parse_from(["logslice", "https://example.com/a.zip"]).is_err());
    }
}
