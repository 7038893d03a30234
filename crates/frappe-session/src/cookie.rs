//! Cookie-jar access and token extraction
//!
//! The browser analog of this layer reads `document.cookie`; here the
//! jar is an injected capability so the reader can be tested without a
//! live HTTP stack. `reqwest::cookie::Jar` implements it out of the box.
//! The layer never writes cookies; the backend's `Set-Cookie` responses,
//! handled by the HTTP client, are the only writer.

use reqwest::cookie::CookieStore;
use url::Url;

use crate::constants::CSRF_COOKIE_NAMES;

/// Read-only view of a cookie jar, keyed by request origin.
pub trait CookieSource: Send + Sync {
    /// Raw `Cookie` header value for the origin
    /// (`name=value; name2=value2`), or `None` when the jar holds nothing
    /// for it.
    fn cookie_header(&self, origin: &Url) -> Option<String>;
}

impl CookieSource for reqwest::cookie::Jar {
    fn cookie_header(&self, origin: &Url) -> Option<String> {
        self.cookies(origin)
            .and_then(|value| value.to_str().map(str::to_owned).ok())
    }
}

/// Extract the current CSRF token from the jar.
///
/// Tries each recognized cookie name in order, exact match first with a
/// case-insensitive fallback, and returns the first hit percent-decoded
/// and trimmed. Absence is represented by the empty string, never an
/// error: callers treat `""` as "not yet available" and defer dependent
/// requests. Pure read: calling twice without jar mutation returns the
/// same value.
pub fn read_csrf_token(source: &dyn CookieSource, origin: &Url) -> String {
    let Some(raw) = source.cookie_header(origin) else {
        return String::new();
    };

    for name in CSRF_COOKIE_NAMES {
        if let Some(value) = find_cookie(&raw, name) {
            return decode_value(value);
        }
    }

    String::new()
}

/// Locate `name` in a raw cookie string. An exact-name pair wins over a
/// case-insensitive match, which covers backends that vary the casing.
fn find_cookie<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    let mut fallback = None;
    for pair in raw.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key == name {
            return Some(value);
        }
        if fallback.is_none() && key.eq_ignore_ascii_case(name) {
            fallback = Some(value);
        }
    }
    fallback
}

/// Percent-decode and trim a cookie value. An undecodable value falls
/// back to the raw text rather than failing the read.
fn decode_value(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.trim().to_owned(),
        Err(_) => value.trim().to_owned(),
    }
}
