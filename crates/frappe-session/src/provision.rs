//! CSRF token provisioning
//!
//! When the cookie is missing, a single authenticated GET against the
//! logged-user endpoint induces the backend to set it. One attempt, no
//! backoff: an empty result means "not available", and the next caller
//! simply tries again.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::constants::LOGGED_USER_METHOD;
use crate::cookie::{CookieSource, read_csrf_token};

/// Give the jar its best-effort chance of holding a CSRF token, and
/// return whatever it holds afterwards.
///
/// Fast path: the token is already present and is returned with no network
/// round-trip. Slow path: one GET to the logged-user endpoint, bounded
/// by `timeout`, sent through `client`, whose cookie store must be the
/// same jar `cookies` reads. The response status is irrelevant; only the
/// `Set-Cookie` side effect matters, so the jar is re-read either way.
///
/// Never returns an error and never panics: a failed round-trip is
/// logged at `warn` and the result is whatever the jar now holds,
/// possibly the empty string. Concurrent callers may each fire the GET;
/// the call is idempotent and the redundancy is tolerated. Dropping the
/// returned future aborts the in-flight request.
pub async fn ensure_csrf_token(
    client: &Client,
    cookies: &dyn CookieSource,
    base_url: &Url,
    timeout: Duration,
) -> String {
    let token = read_csrf_token(cookies, base_url);
    if !token.is_empty() {
        return token;
    }

    let url = match base_url.join(LOGGED_USER_METHOD) {
        Ok(url) => url,
        Err(e) => {
            warn!(base_url = %base_url, error = %e, "invalid provisioning URL");
            return String::new();
        }
    };

    match client.get(url).timeout(timeout).send().await {
        Ok(response) => {
            debug!(status = response.status().as_u16(), "provisioning request completed");
        }
        Err(e) => {
            warn!(error = %e, "provisioning request failed");
        }
    }

    read_csrf_token(cookies, base_url)
}
