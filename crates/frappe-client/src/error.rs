//! Error types for authorized backend calls

use thiserror::Error;

/// Longest error-body slice kept in an error value. Backends can return
/// multi-kilobyte HTML tracebacks.
const MAX_ERROR_BODY: usize = 500;

/// Errors from client operations.
///
/// A missing CSRF token is never an error: the request goes out without
/// the header and the backend's verdict decides. `TokenRejected` is the
/// one denial callers must treat specially: the session has to be
/// reloaded, since retrying with the same stale token fails identically.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request encoding failed: {0}")]
    Encode(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("CSRF token rejected, session reload required: {0}")]
    TokenRejected(String),

    #[error("backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Bound an error body before storing it in an error value.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &body[..end], body.len())
}
