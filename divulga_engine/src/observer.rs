//! Progress and skip observations.
//!
//! The engine performs no console I/O of its own; everything a caller
//! might want to show (download percentages, row counters, skips) flows
//! through [`FetchObserver`]. Events are advisory: dropping them never
//! affects the records produced.

use crate::error::SkipReason;

/// Receives advisory events from the engine.
///
/// Implementations must be cheap; observations fire from hot row loops.
pub trait FetchObserver: Send + Sync {
    /// Bytes received so far, and the total when the server declared one.
    fn on_download_progress(&self, _received: u64, _total: Option<u64>) {}

    /// Rows consumed and matches found so far, emitted periodically while
    /// streaming an entry and once more when the entry ends.
    fn on_progress(&self, _rows_seen: u64, _matches: u64) {}

    /// A resource, archive entry, or row was dropped.
    fn on_skip(&self, _reason: &SkipReason) {}
}

/// Observer that discards every event.
pub struct NoopObserver;

impl FetchObserver for NoopObserver {}

/// Observer that forwards events to `tracing`.
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn on_download_progress(&self, received: u64, total: Option<u64>) {
        match total {
            Some(total) if total > 0 => tracing::debug!(
                "downloaded {received}/{total} bytes ({:.0}%)",
                received as f64 * 100.0 / total as f64
            ),
            _ => tracing::debug!("downloaded {received} bytes"),
        }
    }

    fn on_progress(&self, rows_seen: u64, matches: u64) {
        tracing::debug!("scanned {rows_seen} rows, {matches} matched");
    }

    fn on_skip(&self, reason: &SkipReason) {
        tracing::warn!("{reason}");
    }
}
