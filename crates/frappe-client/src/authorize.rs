//! Outgoing-request authorization
//!
//! Every request is decorated synchronously before send: attach the
//! current CSRF token when one is available, and fix the content-type
//! framing for the payload shape. Attachment is best-effort; this step
//! only reads the token, it never blocks a send on provisioning.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::warn;

use frappe_session::CSRF_HEADER;

/// Body shape of an outgoing request.
///
/// JSON gets explicit framing. Multipart must leave content-type to the
/// transport so it can set the boundary. Form-encoded and empty bodies
/// are framed by the transport as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Empty,
    Json,
    Form,
    Multipart,
}

/// Decorate outgoing headers with the token and the correct framing.
///
/// An empty token attaches nothing: that is the uniform "not yet
/// available" signal, not an error. A multipart payload strips any
/// explicit content-type: a stale JSON content-type on a multipart body
/// makes the backend fail to parse it.
pub fn apply_authorization(headers: &mut HeaderMap, token: &str, payload: PayloadKind) {
    if !token.is_empty() {
        match HeaderValue::from_str(token) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(CSRF_HEADER), value);
            }
            Err(e) => {
                warn!(error = %e, "csrf token is not a valid header value, skipping");
            }
        }
    }

    match payload {
        PayloadKind::Json => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        PayloadKind::Multipart => {
            headers.remove(CONTENT_TYPE);
        }
        PayloadKind::Empty | PayloadKind::Form => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payload_gets_token_and_content_type() {
        let mut headers = HeaderMap::new();
        apply_authorization(&mut headers, "tok-1", PayloadKind::Json);

        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok-1");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn empty_token_attaches_no_header() {
        let mut headers = HeaderMap::new();
        apply_authorization(&mut headers, "", PayloadKind::Json);

        assert!(headers.get(CSRF_HEADER).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn multipart_strips_content_type_with_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        apply_authorization(&mut headers, "tok-1", PayloadKind::Multipart);

        assert!(
            headers.get(CONTENT_TYPE).is_none(),
            "multipart must carry no explicit content-type"
        );
        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok-1");
    }

    #[test]
    fn multipart_strips_content_type_without_token() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        apply_authorization(&mut headers, "", PayloadKind::Multipart);

        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers.get(CSRF_HEADER).is_none());
    }

    #[test]
    fn form_and_empty_leave_framing_to_the_transport() {
        for kind in [PayloadKind::Form, PayloadKind::Empty] {
            let mut headers = HeaderMap::new();
            apply_authorization(&mut headers, "tok-1", kind);
            assert!(headers.get(CONTENT_TYPE).is_none(), "kind: {kind:?}");
            assert_eq!(headers.get(CSRF_HEADER).unwrap(), "tok-1");
        }
    }

    #[test]
    fn token_replaces_existing_header_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(CSRF_HEADER),
            HeaderValue::from_static("stale"),
        );
        apply_authorization(&mut headers, "fresh", PayloadKind::Empty);

        assert_eq!(headers.get(CSRF_HEADER).unwrap(), "fresh");
    }

    #[test]
    fn invalid_token_value_is_skipped_not_panicked() {
        let mut headers = HeaderMap::new();
        apply_authorization(&mut headers, "bad\nvalue", PayloadKind::Json);

        assert!(headers.get(CSRF_HEADER).is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
