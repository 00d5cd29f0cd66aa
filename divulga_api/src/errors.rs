//! Error types for the catalog client.

/// Errors raised when talking to the catalog.
///
/// Catalog failures are fatal for a whole acquisition run: without the
/// catalog no packages or resources can be discovered, so unlike every
/// downstream stage these are never swallowed.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The catalog host could not be reached (connection error or timeout).
    #[error("catalog unreachable")]
    Unavailable,
    /// The catalog answered with a non-success HTTP status.
    #[error("catalog request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The catalog answered 2xx but the action envelope was malformed or
    /// carried `"success": false`.
    #[error("catalog response rejected: {0}")]
    Rejected(String),
}
