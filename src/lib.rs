//! # logslice
//!
//! Extract the lines of a single day from a large, date-ordered log file
//! stored inside a ZIP archive, without reading the whole file.
//!
//! The log entry is opened as a seekable stream, a binary search over its
//! byte offsets finds the first line of the requested date, and a forward
//! scan copies that date's lines until the next day begins.
//!
//! ## Features
//!
//! - Local archives and HTTP/HTTPS URLs read through Range requests
//! - STORED and DEFLATE log entries, ZIP64 archives
//! - Search trace through a pluggable [`SearchObserver`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use logslice::{DateKey, LocalFileReader, Location, OffsetLocator, TraceObserver, ZipExtractor};
//! use logslice::zip::EntrySelector;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new("logs.zip".as_ref())?);
//!     let extractor = ZipExtractor::new(reader);
//!
//!     let selector = EntrySelector::Suffix(".log".to_string());
//!     if let Some(entry) = extractor.select_entry(&selector).await? {
//!         let mut stream = extractor.open_stream(&entry).await?;
//!         let date = DateKey::parse("2024-12-01")?;
//!         if let Location::Found(offset) = OffsetLocator::default()
//!             .locate(&mut stream, &date, &mut TraceObserver)
//!             .await?
//!         {
//!             println!("{} starts at byte {offset}", date);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod extract;
pub mod io;
pub mod search;
pub mod zip;

pub use cli::Cli;
pub use extract::{ArchiveSource, ExtractConfig, Outcome, extract_date};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, RetryPolicy};
pub use search::{DateKey, Location, OffsetLocator, RangeExtractor, SearchObserver, TraceObserver};
pub use zip::{LogStream, ZipExtractor, ZipFileEntry};
