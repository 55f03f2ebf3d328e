//! ZIP archive access.
//!
//! - [`structures`]: fixed records of the format (EOCD, ZIP64, entries)
//! - [`parser`]: central directory parsing over a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: log entry selection and opening
//! - [`stream`]: seekable decompressed views of one entry
//!
//! Supported: single-disk archives, ZIP64, STORED and DEFLATE entries.
//! Not supported: encryption, BZIP2/LZMA/other methods.

mod extractor;
mod parser;
mod stream;
mod structures;

pub use extractor::{EntrySelector, ZipExtractor};
pub use parser::ZipParser;
pub use stream::{DeflateStream, EntryStream, LogStream, StoredStream};
pub use structures::*;
