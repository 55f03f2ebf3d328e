use std::borrow::Cow;

use anyhow::Result;
use memchr::{memchr, memchr_iter};

use super::date::DATE_LEN;
use crate::zip::LogStream;

/// Decode a line, dropping byte sequences that are not valid UTF-8.
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(bytes.utf8_chunks().map(|c| c.valid()).collect()),
    }
}

/// A byte window read from an arbitrary stream offset.
///
/// Line starts are only reported from `from` onwards. When `from > 0` the
/// window also holds the byte before it, so a line beginning exactly at
/// `from` is recognised.
pub struct Chunk {
    base: u64,
    from: u64,
    bytes: Vec<u8>,
    eof: bool,
}

/// A line start together with its date prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub offset: u64,
    pub prefix: &'a [u8],
}

impl Chunk {
    /// Read `[from, until)` from the stream, clipped at its end.
    pub async fn read<S: LogStream + ?Sized>(stream: &mut S, from: u64, until: u64) -> Result<Self> {
        let base = from.saturating_sub(1);
        let until = until.min(stream.size()).max(base);
        let bytes = stream.read_window(base, (until - base) as usize).await?;
        let eof = base + bytes.len() as u64 >= stream.size();
        Ok(Self {
            base,
            from,
            bytes,
            eof,
        })
    }

    /// Offset one past the last byte held
    pub fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }

    /// Absolute offsets of lines beginning in `[from, end)`, ascending
    pub fn line_starts(&self) -> Vec<u64> {
        let end = self.end();
        let mut starts = Vec::new();
        if self.from == 0 && end > 0 {
            starts.push(0);
        }
        for i in memchr_iter(b'\n', &self.bytes) {
            let p = self.base + i as u64 + 1;
            if p >= self.from && p < end {
                starts.push(p);
            }
        }
        starts
    }

    /// Bytes from `offset` up to the next newline or the end of the window.
    ///
    /// The flag tells whether the line is known to end there.
    pub fn line_at(&self, offset: u64) -> (&[u8], bool) {
        let rest = &self.bytes[(offset - self.base) as usize..];
        match memchr(b'\n', rest) {
            Some(n) => (&rest[..n], true),
            None => (rest, self.eof),
        }
    }

    /// Line starts whose date prefix is fully visible, plus the offset of a
    /// trailing line whose prefix is cut off by the window end.
    pub fn candidates(&self) -> (Vec<Candidate<'_>>, Option<u64>) {
        let mut candidates = Vec::new();
        for offset in self.line_starts() {
            let (line, complete) = self.line_at(offset);
            if line.len() < DATE_LEN && !complete {
                return (candidates, Some(offset));
            }
            candidates.push(Candidate {
                offset,
                prefix: &line[..line.len().min(DATE_LEN)],
            });
        }
        (candidates, None)
    }
}
