use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::stream::{DeflateStream, EntryStream, StoredStream};
use super::structures::{CompressionMethod, ZipFileEntry};

/// How the log entry is chosen among the archive's entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySelector {
    /// First regular file, in central directory order, ending with the suffix
    Suffix(String),
    /// The entry with exactly this name
    Name(String),
}

impl EntrySelector {
    pub fn matches(&self, entry: &ZipFileEntry) -> bool {
        match self {
            EntrySelector::Suffix(suffix) => entry.has_suffix(suffix),
            EntrySelector::Name(name) => !entry.is_directory && entry.file_name == *name,
        }
    }
}

/// Opens log entries of a ZIP archive as seekable streams
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Entries accepted by `selector`, in central directory order
    pub async fn log_entries(&self, selector: &EntrySelector) -> Result<Vec<ZipFileEntry>> {
        let entries = self.list_files().await?;
        Ok(entries.into_iter().filter(|e| selector.matches(e)).collect())
    }

    /// The first entry accepted by `selector`, if any.
    ///
    /// Further matches are ignored; they are only mentioned in the log.
    pub async fn select_entry(&self, selector: &EntrySelector) -> Result<Option<ZipFileEntry>> {
        let mut matches = self.log_entries(selector).await?.into_iter();
        let first = matches.next();
        if let Some(ref entry) = first {
            let skipped = matches.count();
            if skipped > 0 {
                tracing::info!(entry = %entry.file_name, skipped, "several log entries match, using the first");
            }
        }
        Ok(first)
    }

    /// Open an entry's decompressed content for seeking and reading
    pub async fn open_stream(&self, entry: &ZipFileEntry) -> Result<EntryStream<R>> {
        if entry.is_encrypted {
            bail!("Entry {} is encrypted and cannot be searched", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        if data_offset.saturating_add(entry.compressed_size) > self.parser.reader().size() {
            bail!("Entry {} extends past the end of the archive", entry.file_name);
        }

        let reader = Arc::clone(self.parser.reader());
        let stream = match entry.compression_method {
            CompressionMethod::Stored => EntryStream::Stored(StoredStream::new(
                reader,
                data_offset,
                entry.uncompressed_size,
            )),
            CompressionMethod::Deflate => EntryStream::Deflate(DeflateStream::new(
                reader,
                data_offset,
                entry.compressed_size,
                entry.uncompressed_size,
            )),
            CompressionMethod::Unknown(_) => bail!(
                "Unsupported compression method: {} (only STORED and DEFLATE are supported)",
                entry.compression_method.as_u16()
            ),
        };

        tracing::debug!(
            entry = %entry.file_name,
            method = entry.compression_method.as_u16(),
            size = entry.uncompressed_size,
            data_offset,
            "log entry opened"
        );
        Ok(stream)
    }
}
