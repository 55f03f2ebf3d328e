use anyhow::Result;
use memchr::memchr_iter;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::chunk::decode_lossy;
use super::date::DateKey;
use super::locator::DEFAULT_CHUNK_SIZE;
use crate::zip::LogStream;

/// Totals of one forward scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub lines: u64,
    pub bytes: u64,
    /// The scan stopped at a line of the following day rather than at the
    /// end of the stream.
    pub reached_next_day: bool,
}

enum LineAction {
    Keep,
    Skip,
    Stop,
}

/// Streams forward from a located offset, keeping the target date's lines
#[derive(Debug, Clone, Copy)]
pub struct RangeExtractor {
    chunk_size: usize,
}

impl Default for RangeExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl RangeExtractor {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Copy every line starting with `target` to `sink`, beginning at `start`
    /// and stopping at the first line of the next day or the end of stream.
    ///
    /// A line split across two reads is reassembled before it is examined.
    pub async fn extract<S, W>(&self, stream: &mut S, start: u64, target: &DateKey, sink: &mut W) -> Result<ScanSummary>
    where
        S: LogStream + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        // Without a following day the scan can only end at end of stream.
        let next = target.next_day();
        let mut summary = ScanSummary::default();

        stream.seek(start).await?;
        let mut buf = vec![0u8; self.chunk_size];
        let mut pending: Vec<u8> = Vec::new();

        'scan: loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&buf[..n]);

            let mut consumed = 0;
            for newline in memchr_iter(b'\n', &pending) {
                let line = &pending[consumed..newline];
                consumed = newline + 1;
                if !emit(line, target, next.as_ref(), sink, &mut summary).await? {
                    summary.reached_next_day = true;
                    break 'scan;
                }
            }
            pending.drain(..consumed);
        }

        if !summary.reached_next_day && !pending.is_empty() {
            let more = emit(&pending, target, next.as_ref(), sink, &mut summary).await?;
            summary.reached_next_day = !more;
        }

        sink.flush().await?;
        tracing::debug!(
            lines = summary.lines,
            bytes = summary.bytes,
            reached_next_day = summary.reached_next_day,
            end = stream.position(),
            "scan finished"
        );
        Ok(summary)
    }
}

fn classify(line: &str, target: &DateKey, next: Option<&DateKey>) -> LineAction {
    if next.is_some_and(|next| next.prefixes(line.as_bytes())) {
        LineAction::Stop
    } else if target.prefixes(line.as_bytes()) {
        LineAction::Keep
    } else {
        LineAction::Skip
    }
}

/// Handle one line; returns false once the next day is reached.
async fn emit<W>(raw: &[u8], target: &DateKey, next: Option<&DateKey>, sink: &mut W, summary: &mut ScanSummary) -> Result<bool>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let line = decode_lossy(raw);
    match classify(&line, target, next) {
        LineAction::Stop => Ok(false),
        LineAction::Skip => Ok(true),
        LineAction::Keep => {
            sink.write_all(line.as_bytes()).await?;
            sink.write_all(b"\n").await?;
            summary.lines += 1;
            summary.bytes += line.len() as u64 + 1;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::StoredStream;
    use std::sync::Arc;

    async fn scan(data: &[u8], start: u64, chunk: usize, target: &str) -> (String, ScanSummary) {
        let mut stream = StoredStream::new(Arc::new(MemoryReader::new(data.to_vec())), 0, data.len() as u64);
        let mut out = Vec::new();
        let target = DateKey::parse(target).unwrap();
        let summary = RangeExtractor::new(chunk)
            .extract(&mut stream, start, &target, &mut out)
            .await
            .unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[tokio::test]
    async fn stops_at_next_day() {
        let data = b"2024-11-30 a\n2024-12-01 b\n2024-12-01 c\n2024-12-02 d\n2024-12-01 late\n";
        let (out, summary) = scan(data, 0, 1024, "2024-12-01").await;
        assert_eq!(out, "2024-12-01 b\n2024-12-01 c\n");
        assert_eq!(summary.lines, 2);
        assert!(summary.reached_next_day);
    }

    #[tokio::test]
    async fn runs_to_end_without_next_day() {
        let data = b"2024-12-30 x\n2024-12-31 a\n2024-12-31 b";
        let (out, summary) = scan(data, 13, 1024, "2024-12-31").await;
        assert_eq!(out, "2024-12-31 a\n2024-12-31 b\n");
        assert!(!summary.reached_next_day);
    }

    #[tokio::test]
    async fn lines_across_chunk_boundaries_stay_whole() {
        let mut data = Vec::new();
        for n in 0..200 {
            data.extend_from_slice(format!("2024-12-01 event number {n}\n").as_bytes());
        }
        data.extend_from_slice(b"2025-01-01 other\n");
        let (out, summary) = scan(&data, 0, 7, "2024-12-01").await;
        assert_eq!(out.as_bytes(), &data[..data.len() - 17]);
        assert_eq!(summary.lines, 200);
        assert_eq!(summary.bytes, (data.len() - 17) as u64);
    }

    #[tokio::test]
    async fn next_day_prefix_cut_by_chunk_still_stops() {
        let data = b"2024-12-01 a\n2024-12-02 b\n2024-12-01 c\n";
        let (out, _) = scan(data, 0, 16, "2024-12-01").await;
        assert_eq!(out, "2024-12-01 a\n");
    }

    #[tokio::test]
    async fn last_representable_day_scans_to_end() {
        let data = b"9999-12-30 a\n9999-12-31 b\n9999-12-31 c\n";
        let (out, summary) = scan(data, 0, 1024, "9999-12-31").await;
        assert_eq!(out, "9999-12-31 b\n9999-12-31 c\n");
        assert!(!summary.reached_next_day);
    }

    #[tokio::test]
    async fn invalid_bytes_are_dropped_from_output() {
        let data = b"2024-12-01 caf\xc3\xa9 \xff ok\n";
        let (out, _) = scan(data, 0, 1024, "2024-12-01").await;
        assert_eq!(out, "2024-12-01 caf\u{e9}  ok\n");
    }
}
