//! Authorized HTTP client for Frappe-style REST backends
//!
//! Builds on `frappe-session`: the session crate owns token extraction
//! and provisioning; this crate decorates every outgoing request with
//! the current token and the content framing the backend expects,
//! classifies authorization denials so a rejected token is
//! distinguishable from an ordinary permissions failure, and exposes a
//! small typed surface over the backend's `api/method` and
//! `api/resource` endpoints.
//!
//! Request flow:
//! 1. `Config::load()` or `Config::from_env()`: backend address, timeouts
//! 2. `FrappeClient::new()`: HTTP client over a shared cookie jar
//! 3. `FrappeClient::login()`: session cookies land in the jar
//! 4. `FrappeClient::ensure_csrf_token()` (or `spawn_token_bootstrap()`)
//! 5. Typed calls, with the token attached and denials classified

pub mod authorize;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod secret;

pub use authorize::{PayloadKind, apply_authorization};
pub use classify::{Rejection, classify_403, classify_status};
pub use client::{FileRef, FileUpload, FrappeClient};
pub use config::{BackendConfig, Config};
pub use error::{Error, Result};
pub use secret::Password;
