use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Context, Result, bail};

/// How often a ranged GET is retried after a timeout or connection failure,
/// and the pause before the first retry (it grows linearly).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Remote archive read through HTTP Range requests.
///
/// Each window the date search inspects becomes one ranged GET, so locating
/// a day inside a STORED log entry only transfers the windows that were
/// looked at. [`HttpRangeReader::transferred_bytes`] reports the total.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    retry: RetryPolicy,
    transferred: AtomicU64,
}

impl HttpRangeReader {
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Self::connect(client, url, RetryPolicy::default()).await
    }

    /// Sends a HEAD request to learn the archive size and make sure the
    /// server honours byte ranges.
    pub async fn connect(client: Client, url: String, retry: RetryPolicy) -> Result<Self> {
        let resp = client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("HEAD {url}"))?;

        if !resp.status().is_success() {
            bail!("HEAD {url} failed with status {}", resp.status());
        }
        let size = remote_size(resp.headers()).with_context(|| format!("cannot read {url} by range"))?;

        tracing::debug!(%url, size, "remote archive opened");
        Ok(Self {
            client,
            url,
            size,
            retry,
            transferred: AtomicU64::new(0),
        })
    }

    /// Bytes received from the network so far
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// One ranged GET for the inclusive range `[start, end]`, retried on
    /// transport failures. The body may be shorter than asked.
    async fn fetch(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let range = format!("bytes={start}-{end}");
        let mut failures = 0;

        loop {
            let err = match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) => {
                    if resp.status() != StatusCode::PARTIAL_CONTENT {
                        bail!("GET {} ({range}) answered {}", self.url, resp.status());
                    }
                    if let Some(first) = range_start(resp.headers())
                        && first != start
                    {
                        bail!("server sent range starting at {first}, asked for {range}");
                    }
                    let body = resp.bytes().await?;
                    self.transferred.fetch_add(body.len() as u64, Ordering::Relaxed);
                    return Ok(body.to_vec());
                }
                Err(err) if err.is_timeout() || err.is_connect() => err,
                Err(err) => return Err(err.into()),
            };

            failures += 1;
            if failures >= self.retry.attempts {
                return Err(err).context(format!("giving up on {range} after {failures} attempts"));
            }
            tracing::warn!(attempt = failures, max = self.retry.attempts, error = %err, %range, "range request failed, retrying");
            tokio::time::sleep(self.retry.backoff * failures).await;
        }
    }
}

/// Archive size from a HEAD response advertising byte ranges.
fn remote_size(headers: &HeaderMap) -> Result<u64> {
    let accepts = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("bytes"));
    if !accepts {
        bail!("server does not support Range requests");
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .context("server did not return Content-Length")
}

/// First offset of a `Content-Range: bytes <first>-<last>/<total>` header.
fn range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let (first, _) = value.strip_prefix("bytes ")?.split_once('-')?;
    first.trim().parse().ok()
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let last = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (last - offset + 1) as usize;
        let mut filled = 0;

        // Servers may cap a response; keep asking for the remainder.
        while filled < wanted {
            let body = self.fetch(offset + filled as u64, last).await?;
            if body.is_empty() {
                bail!("server returned an empty body for bytes {}-{last}", offset + filled as u64);
            }
            let n = body.len().min(wanted - filled);
            buf[filled..filled + n].copy_from_slice(&body[..n]);
            filled += n;
        }

        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
