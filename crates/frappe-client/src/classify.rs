//! Authorization-denial classification
//!
//! The backend reports a rejected anti-forgery token as a 403 whose JSON
//! body names the exception class. Only that shape warrants the "reload
//! the session" path; every other denial is an ordinary permissions
//! failure owned by the caller.

use serde::Deserialize;

/// Substring the backend embeds in the `exception` field when the
/// anti-forgery token specifically was rejected.
const CSRF_EXCEPTION_MARKER: &str = "CSRFTokenError";

/// How an authorization denial should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The anti-forgery token was rejected. Reload the session; retrying
    /// with the same token fails identically.
    CsrfToken,
    /// Any other denial. Propagated to the caller unchanged.
    Generic,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    exception: String,
}

/// Classify a 403 body. Non-JSON bodies and bodies without the CSRF
/// exception marker are generic denials.
pub fn classify_403(body: &str) -> Rejection {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if parsed.exception.contains(CSRF_EXCEPTION_MARKER) => Rejection::CsrfToken,
        _ => Rejection::Generic,
    }
}

/// Classify a response by status and body. Only a 403 can be a token
/// rejection; every other status is generic.
pub fn classify_status(status: u16, body: &str) -> Rejection {
    match status {
        403 => classify_403(body),
        _ => Rejection::Generic,
    }
}
