//! Unified error types.

use std::net::AddrParseError;

/// Boxed error carried by a request body stream.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by agw's fallible infrastructure operations.
///
/// Client mistakes (a malformed body, say) never become an `Error`: the
/// middleware answers them with a `400` [`Response`](crate::Response). This
/// type covers binding to a port and accepting connections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid socket address: {0}")]
    Addr(#[from] AddrParseError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a body-parsing middleware rejected a request.
///
/// Every variant is answered with `400 Bad Request`.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    /// The body stream failed mid-read (client hung up, connection reset, ...).
    #[error("read body: {0}")]
    Read(#[source] BoxError),

    /// The body was read but is not valid JSON. An empty body lands here too.
    #[error("parse json body: {0}")]
    Json(#[from] serde_json::Error),
}
