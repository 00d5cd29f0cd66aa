//! Resilient HTTP downloader for catalog resources.

use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use crate::error::DownloadError;
use crate::observer::FetchObserver;
use crate::retry::RetryPolicy;

/// Bound on establishing a connection to the host.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on one stalled read, not on the whole transfer: a large archive
/// from a slow host may legitimately stream for much longer than this.
/// The policy's overall deadline is the only end-to-end bound.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads resource payloads with bounded retries and chunked reads.
///
/// A failed download is an expected outcome here, not an exception:
/// callers map it to "no data for this resource" and continue with the
/// remaining resources.
pub struct Downloader {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl Downloader {
    pub fn new(policy: RetryPolicy) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()?;
        Ok(Self { client, policy })
    }

    /// Fetches the complete payload at `url`, retrying transient failures
    /// per the policy. The observer sees byte-level progress; when the
    /// server declares a length the events carry the total as well.
    ///
    /// Never returns a partial body: a stream that ends short of the
    /// declared length is an error (and retried as transient).
    pub async fn download(
        &self,
        url: &str,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<u8>, DownloadError> {
        let deadline = Instant::now() + self.policy.overall_timeout;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DownloadError::DeadlineExceeded);
            }
            let outcome = match timeout(remaining, self.fetch_once(url, observer)).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(DownloadError::DeadlineExceeded),
            };
            match outcome {
                Ok(body) => return Ok(body),
                Err(err) => {
                    if attempt >= self.policy.max_attempts || !self.policy.is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.policy.delay_for_attempt(attempt + 1);
                    tracing::warn!(
                        "download of {url} failed (attempt {attempt}/{}), retrying in {:.0}s: {err}",
                        self.policy.max_attempts,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        observer: &dyn FetchObserver,
    ) -> Result<Vec<u8>, DownloadError> {
        let mut resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let total = resp.content_length();
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            body.extend_from_slice(&chunk);
            observer.on_download_progress(body.len() as u64, total);
        }

        if let Some(expected) = total {
            if (body.len() as u64) < expected {
                return Err(DownloadError::Truncated {
                    received: body.len() as u64,
                    expected,
                });
            }
        }
        Ok(body)
    }
}
