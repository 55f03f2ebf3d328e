//! Seekable views over the decompressed content of one archive entry.
//!
//! STORED entries map every read straight onto the archive reader, so seeks
//! are free. DEFLATE entries have no random access: a forward seek inflates
//! and discards, a backward seek restarts inflation from the entry start.

use async_trait::async_trait;
use flate2::{Decompress, FlushDecompress, Status};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

/// Compressed bytes fetched from the archive per refill.
const INPUT_BUFFER_SIZE: usize = 64 * 1024;

/// Scratch size used when inflating bytes that a seek skips over.
const SKIP_BUFFER_SIZE: usize = 64 * 1024;

/// A seekable, readable byte source of known length
#[async_trait]
pub trait LogStream: Send {
    /// Total decompressed length
    fn size(&self) -> u64;

    /// Current read position
    fn position(&self) -> u64;

    /// Move the read position; positions past the end clamp to the end.
    async fn seek(&mut self, pos: u64) -> Result<()>;

    /// Read from the current position, returning 0 only at end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read `len` bytes starting at `offset`, fewer only when the stream ends.
    async fn read_window(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.seek(offset).await?;
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

/// Uncompressed entry data
#[derive(Debug)]
pub struct StoredStream<R: ReadAt> {
    reader: Arc<R>,
    data_offset: u64,
    size: u64,
    pos: u64,
}

impl<R: ReadAt> StoredStream<R> {
    pub fn new(reader: Arc<R>, data_offset: u64, size: u64) -> Self {
        Self {
            reader,
            data_offset,
            size,
            pos: 0,
        }
    }
}

#[async_trait]
impl<R: ReadAt> LogStream for StoredStream<R> {
    fn size(&self) -> u64 {
        self.size
    }

    fn position(&self) -> u64 {
        self.pos
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = pos.min(self.size);
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.size - self.pos;
        let want = (buf.len() as u64).min(remaining) as usize;
        if want == 0 {
            return Ok(0);
        }
        let n = self
            .reader
            .read_at(self.data_offset + self.pos, &mut buf[..want])
            .await?;
        if n == 0 {
            bail!("Archive truncated inside entry data at offset {}", self.pos);
        }
        self.pos += n as u64;
        Ok(n)
    }
}

/// Raw DEFLATE entry data, inflated on demand
#[derive(Debug)]
pub struct DeflateStream<R: ReadAt> {
    reader: Arc<R>,
    data_offset: u64,
    compressed_size: u64,
    size: u64,
    pos: u64,
    decoder: Decompress,
    /// Compressed bytes fetched so far
    fetched: u64,
    input: Vec<u8>,
    input_pos: usize,
    finished: bool,
}

impl<R: ReadAt> DeflateStream<R> {
    pub fn new(reader: Arc<R>, data_offset: u64, compressed_size: u64, size: u64) -> Self {
        Self {
            reader,
            data_offset,
            compressed_size,
            size,
            pos: 0,
            decoder: Decompress::new(false),
            fetched: 0,
            input: Vec::with_capacity(INPUT_BUFFER_SIZE),
            input_pos: 0,
            finished: false,
        }
    }

    fn rewind(&mut self) {
        self.decoder.reset(false);
        self.pos = 0;
        self.fetched = 0;
        self.input.clear();
        self.input_pos = 0;
        self.finished = false;
    }

    async fn refill(&mut self) -> Result<()> {
        let want = (self.compressed_size - self.fetched).min(INPUT_BUFFER_SIZE as u64) as usize;
        self.input.resize(want, 0);
        let n = self
            .reader
            .read_at(self.data_offset + self.fetched, &mut self.input)
            .await?;
        if n == 0 {
            bail!("Archive truncated inside compressed entry data");
        }
        self.input.truncate(n);
        self.input_pos = 0;
        self.fetched += n as u64;
        Ok(())
    }

    async fn inflate(&mut self, out: &mut [u8]) -> Result<usize> {
        loop {
            if self.finished || out.is_empty() {
                return Ok(0);
            }
            if self.input_pos == self.input.len() && self.fetched < self.compressed_size {
                self.refill().await?;
            }
            let input_done = self.input_pos == self.input.len() && self.fetched == self.compressed_size;

            let before_in = self.decoder.total_in();
            let before_out = self.decoder.total_out();
            let status = self.decoder.decompress(
                &self.input[self.input_pos..],
                out,
                FlushDecompress::None,
            )?;
            let consumed = (self.decoder.total_in() - before_in) as usize;
            let produced = (self.decoder.total_out() - before_out) as usize;
            self.input_pos += consumed;

            if status == Status::StreamEnd {
                self.finished = true;
            }
            if produced > 0 {
                self.pos += produced as u64;
                return Ok(produced);
            }
            if self.finished {
                return Ok(0);
            }
            if input_done && consumed == 0 {
                bail!("Compressed entry ended before its declared size");
            }
        }
    }
}

#[async_trait]
impl<R: ReadAt> LogStream for DeflateStream<R> {
    fn size(&self) -> u64 {
        self.size
    }

    fn position(&self) -> u64 {
        self.pos
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        let target = pos.min(self.size);
        if target < self.pos {
            tracing::trace!(from = self.pos, to = target, "restarting inflate for backward seek");
            self.rewind();
        }
        let mut scratch = vec![0u8; SKIP_BUFFER_SIZE];
        while self.pos < target {
            let want = ((target - self.pos) as usize).min(scratch.len());
            if self.inflate(&mut scratch[..want]).await? == 0 {
                bail!("Compressed entry ended at {} before seek target {}", self.pos, target);
            }
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.size - self.pos;
        let want = (buf.len() as u64).min(remaining) as usize;
        self.inflate(&mut buf[..want]).await
    }
}

/// Stream over whichever compression method the entry uses
#[derive(Debug)]
pub enum EntryStream<R: ReadAt> {
    Stored(StoredStream<R>),
    Deflate(DeflateStream<R>),
}

#[async_trait]
impl<R: ReadAt> LogStream for EntryStream<R> {
    fn size(&self) -> u64 {
        match self {
            EntryStream::Stored(s) => s.size(),
            EntryStream::Deflate(s) => s.size(),
        }
    }

    fn position(&self) -> u64 {
        match self {
            EntryStream::Stored(s) => s.position(),
            EntryStream::Deflate(s) => s.position(),
        }
    }

    async fn seek(&mut self, pos: u64) -> Result<()> {
        match self {
            EntryStream::Stored(s) => s.seek(pos).await,
            EntryStream::Deflate(s) => s.seek(pos).await,
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            EntryStream::Stored(s) => s.read(buf).await,
            EntryStream::Deflate(s) => s.read(buf).await,
        }
    }
}
