//! Session-credential layer for Frappe-style backends
//!
//! Acquires and tracks the per-session anti-forgery token the backend
//! requires on mutating requests. The token is minted and validated
//! server-side; this crate only observes it through the HTTP client's
//! cookie jar and, when it is missing, nudges the backend into setting
//! it. This is a standalone library with no dependency on the typed
//! client and can be tested and used independently.
//!
//! Credential flow:
//! 1. The backend sets the CSRF cookie on an authenticated session
//! 2. `cookie::read_csrf_token()` extracts it from the shared jar
//! 3. `provision::ensure_csrf_token()` triggers the backend to set the
//!    cookie when the jar is empty (single bounded GET, never fails)
//! 4. `bootstrap::spawn_token_bootstrap()` runs one provisioning attempt
//!    in the background and publishes "token, still loading?" state

pub mod bootstrap;
pub mod constants;
pub mod cookie;
pub mod provision;

pub use bootstrap::{TokenState, spawn_token_bootstrap};
pub use constants::*;
pub use cookie::{CookieSource, read_csrf_token};
pub use provision::ensure_csrf_token;
