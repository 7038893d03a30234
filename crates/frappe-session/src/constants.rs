//! Frappe session constants
//!
//! Cookie names, header name, and endpoint path observed from the target
//! backend. These are not general CSRF-protocol values: Frappe exposes
//! no negotiation mechanism for them, so swapping backends means
//! revisiting this file. None of them are secrets; the token itself
//! lives in the cookie jar.

use std::time::Duration;

/// Cookie names that may carry the CSRF token, in lookup order.
/// Naming varies across backend versions; only one is expected to be
/// present at a time, so the order is a tie-break.
pub const CSRF_COOKIE_NAMES: [&str; 3] = ["csrf_token", "frappe-csrf-token", "csrftoken"];

/// Header that carries the token on outgoing requests.
/// The backend documents it as `X-Frappe-CSRF-Token`; header names are
/// case-insensitive on the wire and `HeaderName` wants the lowercase form.
pub const CSRF_HEADER: &str = "x-frappe-csrf-token";

/// Known-safe GET endpoint that reflects the logged-in user. Hitting it
/// on an authenticated session causes the backend to set the CSRF cookie,
/// which is all the provisioner needs from it.
pub const LOGGED_USER_METHOD: &str = "api/method/frappe.auth.get_logged_user";

/// Default bound on the provisioning round-trip, so a stalled network
/// cannot hang callers indefinitely.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(10);
