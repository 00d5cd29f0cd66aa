//! Error taxonomy for the acquisition engine.
//!
//! Only two failures are fatal to a fetch: the catalog being unavailable
//! and a malformed caller scope. Everything else (a resource that will not
//! download, a corrupt archive entry, an undecodable row, a record that
//! fails validation) is absorbed at the smallest possible scope and
//! surfaced as a [`SkipReason`] observation so the pipeline keeps making
//! forward progress.

use std::fmt;

use thiserror::Error;

/// Fatal errors surfaced to the engine caller.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The catalog is unreachable or rejected the request. Nothing
    /// downstream can proceed without it.
    #[error("catalog error: {0}")]
    Catalog(#[from] divulga_api::CatalogError),
    /// The caller supplied a malformed scope (e.g. a target CPF that is
    /// not 11 digits).
    #[error("invalid scope: {0}")]
    InvalidScope(String),
    /// The HTTP client could not be constructed.
    #[error("http client initialization failed: {0}")]
    Init(String),
}

/// Failure of a single resource download.
///
/// Never fatal to a batch: the engine records a skip and continues with
/// sibling resources.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("server answered status {status}")]
    HttpStatus { status: u16 },
    #[error("body truncated: received {received} of {expected} bytes")]
    Truncated { received: u64, expected: u64 },
    #[error("download exceeded the overall deadline")]
    DeadlineExceeded,
}

/// Why a unit of work was dropped without failing the batch.
#[derive(Debug)]
pub enum SkipReason {
    /// A resource could not be downloaded after exhausting retries.
    ResourceDownloadFailed {
        resource: String,
        error: DownloadError,
    },
    /// An archive (or one of its entries) could not be opened.
    ArchiveEntryCorrupt { entry: String, detail: String },
    /// A row could not be decoded from the CSV stream.
    RowDecodeError { entry: String, detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceDownloadFailed { resource, error } => {
                write!(f, "resource {resource} skipped: {error}")
            }
            Self::ArchiveEntryCorrupt { entry, detail } => {
                write!(f, "archive entry {entry} skipped: {detail}")
            }
            Self::RowDecodeError { entry, detail } => {
                write!(f, "row in {entry} skipped: {detail}")
            }
        }
    }
}
