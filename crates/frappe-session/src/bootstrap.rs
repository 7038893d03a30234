//! One-shot session bootstrap
//!
//! Components that need "current token, still loading?" at startup
//! subscribe to a watch channel fed by a single provisioning attempt,
//! instead of each firing their own redundant round-trip.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

use crate::cookie::CookieSource;
use crate::provision::ensure_csrf_token;

/// Snapshot of the session-credential state.
///
/// `loading` is true until the bootstrap attempt finishes. Afterwards an
/// empty `token` means provisioning could not produce one; callers defer
/// token-dependent requests rather than treating that as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub token: String,
    pub loading: bool,
}

impl TokenState {
    /// True once bootstrap finished with a usable token.
    pub fn is_ready(&self) -> bool {
        !self.loading && !self.token.is_empty()
    }
}

/// Spawn a task that provisions the CSRF token once and publishes the
/// result.
///
/// The receiver starts at `{ token: "", loading: true }` and sees exactly
/// one update. The task never fails; if every receiver is dropped the
/// final send is simply discarded.
pub fn spawn_token_bootstrap(
    client: Client,
    cookies: Arc<dyn CookieSource>,
    base_url: Url,
    timeout: Duration,
) -> watch::Receiver<TokenState> {
    let (tx, rx) = watch::channel(TokenState {
        token: String::new(),
        loading: true,
    });

    tokio::spawn(async move {
        let token = ensure_csrf_token(&client, cookies.as_ref(), &base_url, timeout).await;
        debug!(found = !token.is_empty(), "session bootstrap finished");
        let _ = tx.send(TokenState {
            token,
            loading: false,
        });
    });

    rx
}
