//! Binary search for the first line of a date.
//!
//! Byte offsets do not line up with lines, so each probe reads a window of
//! two chunks around the midpoint and reasons about the lines that start
//! inside it. Once a window shows the target date without showing where its
//! range begins, the search walks back one chunk at a time until a chunk
//! starts before the target date.

use std::cmp::Ordering;

use anyhow::{Result, bail};

use super::chunk::Chunk;
use super::date::{DATE_LEN, DateKey};
use super::observer::{Probe, RefineStep, SearchObserver, SearchWindow, Verdict};
use crate::zip::LogStream;

/// Default probe and scan granularity.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Windows must be wide enough to show a full date prefix past the midpoint.
pub const MIN_CHUNK_SIZE: usize = 64;

/// Result of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Offset to start scanning from
    Found(u64),
    NotFound,
}

/// Finds where a date's lines begin in a date-ordered stream
#[derive(Debug, Clone, Copy)]
pub struct OffsetLocator {
    chunk_size: u64,
}

impl Default for OffsetLocator {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE as u64,
        }
    }
}

impl OffsetLocator {
    pub fn new(chunk_size: usize) -> Result<Self> {
        if chunk_size < MIN_CHUNK_SIZE {
            bail!("chunk size must be at least {MIN_CHUNK_SIZE} bytes, got {chunk_size}");
        }
        Ok(Self {
            chunk_size: chunk_size as u64,
        })
    }

    /// Offset of the first line starting with `target`.
    ///
    /// The returned offset is 0 or directly follows the newline of an
    /// earlier-dated line, except for the degenerate case of a line longer
    /// than the window sitting inside the search range, where the midpoint
    /// is returned as is.
    pub async fn locate<S, O>(&self, stream: &mut S, target: &DateKey, observer: &mut O) -> Result<Location>
    where
        S: LogStream + ?Sized,
        O: SearchObserver + ?Sized,
    {
        let chunk = self.chunk_size;
        let mut window = SearchWindow::new(stream.size());

        while !window.is_empty() {
            let mid = window.midpoint();
            let chunk_start = mid.saturating_sub(chunk);
            let probe = Chunk::read(stream, chunk_start, chunk_start + 2 * chunk).await?;
            let (candidates, cut) = probe.candidates();

            // First visible line not earlier than the target.
            let split = candidates
                .iter()
                .position(|c| c.prefix.cmp(target.as_bytes()) != Ordering::Less);

            // With no visible line start, `[chunk_start, blank_until)` holds none.
            let blank_until = cut.unwrap_or_else(|| probe.end());

            let verdict = match split {
                // The rest of the window is one line that began before the chunk.
                _ if candidates.is_empty() && blank_until >= window.right => Verdict::Later,
                _ if candidates.is_empty() => Verdict::Degenerate,
                None => Verdict::Earlier,
                Some(i) => {
                    let c = candidates[i];
                    // Nothing before `c` is unaccounted for when an earlier line
                    // precedes it in the window or it is the very first line.
                    let bounded = i > 0 || c.offset == 0;
                    match (c.prefix == target.as_bytes(), bounded) {
                        (true, _) => Verdict::Match(c.offset),
                        (false, true) => Verdict::Absent,
                        (false, false) => Verdict::Later,
                    }
                }
            };

            observer.on_probe(&Probe {
                window,
                mid,
                chunk_start,
                verdict,
            });

            match verdict {
                Verdict::Degenerate => return Ok(Location::Found(mid)),
                Verdict::Absent => return Ok(Location::NotFound),
                Verdict::Earlier => {
                    // Lines up to the last candidate are earlier, and no line
                    // starts between it and the cut-off line or window end.
                    window.left = blank_until;
                }
                Verdict::Later => {
                    window.right = chunk_start;
                }
                Verdict::Match(offset) => {
                    let bounded = split.is_some_and(|i| i > 0) || offset == 0;
                    let first = if bounded {
                        offset
                    } else {
                        self.refine(stream, target, offset, chunk_start, observer).await?
                    };
                    return Ok(Location::Found(first));
                }
            }
        }

        Ok(Location::NotFound)
    }

    /// Walk back from a matching line at `first` to the first line of its date.
    ///
    /// No line starts in `[cursor, first)`. Each step reads the chunk before
    /// `cursor`; the walk ends at a line that does not start with the target
    /// date, or at offset 0.
    async fn refine<S, O>(
        &self,
        stream: &mut S,
        target: &DateKey,
        mut first: u64,
        mut cursor: u64,
        observer: &mut O,
    ) -> Result<u64>
    where
        S: LogStream + ?Sized,
        O: SearchObserver + ?Sized,
    {
        while cursor > 0 {
            let chunk_start = cursor.saturating_sub(self.chunk_size);
            // The tail lets prefixes of lines starting just before `cursor` be compared.
            let probe = Chunk::read(stream, chunk_start, cursor + DATE_LEN as u64).await?;

            let mut still_matching = true;
            for offset in probe.line_starts().into_iter().rev() {
                if offset >= cursor {
                    continue;
                }
                let (line, _) = probe.line_at(offset);
                if target.prefixes(line) {
                    first = offset;
                } else {
                    still_matching = false;
                    break;
                }
            }

            observer.on_refine(&RefineStep {
                chunk_start,
                first,
                still_matching,
            });

            if !still_matching {
                break;
            }
            cursor = chunk_start;
        }

        Ok(first)
    }
}
