//! Authorized client for a Frappe-style REST backend
//!
//! Wraps `reqwest::Client` around the session-credential layer: all
//! requests share one cookie jar, every send reads the current CSRF
//! token out of it and attaches it (best-effort, never blocking on
//! provisioning), JSON and multipart bodies get the framing the backend
//! expects, and authorization denials are classified so a rejected token
//! surfaces distinctly from an ordinary permissions failure.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error};
use url::Url;

use frappe_session::{
    CookieSource, LOGGED_USER_METHOD, TokenState, ensure_csrf_token, read_csrf_token,
    spawn_token_bootstrap,
};

use crate::authorize::{PayloadKind, apply_authorization};
use crate::classify::{Rejection, classify_status};
use crate::config::Config;
use crate::error::{Error, Result, truncate_body};
use crate::secret::Password;

/// `api/resource` responses arrive wrapped in a `data` envelope.
#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// `api/method` responses arrive wrapped in a `message` envelope.
#[derive(Deserialize)]
struct MessageEnvelope<T> {
    message: T,
}

/// Stored-file reference returned by the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub file_url: String,
}

/// Descriptor for `upload_file`.
#[derive(Debug)]
pub struct FileUpload {
    pub file_name: String,
    pub content: Vec<u8>,
    /// Attach the stored file to this document, if any.
    pub doctype: Option<String>,
    pub docname: Option<String>,
    pub is_private: bool,
}

/// Internal request payload, carried to the send step. The kind drives
/// the authorizer's framing decision; the transport fills in whatever
/// the authorizer left to it (form encoding, multipart boundary).
enum Payload {
    Empty,
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
    Multipart(Form),
}

impl Payload {
    fn kind(&self) -> PayloadKind {
        match self {
            Payload::Empty => PayloadKind::Empty,
            Payload::Json(_) => PayloadKind::Json,
            Payload::Form(_) => PayloadKind::Form,
            Payload::Multipart(_) => PayloadKind::Multipart,
        }
    }
}

fn json_payload<B: Serialize>(body: &B) -> Result<Payload> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| Error::Encode(format!("serializing request body: {e}")))?;
    Ok(Payload::Json(bytes))
}

/// Authorized client for a Frappe-style backend.
///
/// Clone is cheap; the underlying `reqwest::Client` and cookie jar are
/// shared behind `Arc`, so clones see the same session.
#[derive(Clone)]
pub struct FrappeClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    base_url: Url,
    provision_timeout: Duration,
}

impl FrappeClient {
    /// Build a client from configuration. The cookie jar starts empty;
    /// `login` (or an out-of-band session cookie) populates it.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.backend.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url: {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            http,
            jar,
            base_url,
            provision_timeout: Duration::from_secs(config.backend.provision_timeout_secs),
        })
    }

    /// Current CSRF token from the cookie jar, or `""` when absent.
    pub fn csrf_token(&self) -> String {
        read_csrf_token(self.jar.as_ref(), &self.base_url)
    }

    /// Provision the CSRF token if the jar does not hold one yet.
    /// Resolves to `""` when provisioning fails; never an error.
    pub async fn ensure_csrf_token(&self) -> String {
        ensure_csrf_token(
            &self.http,
            self.jar.as_ref(),
            &self.base_url,
            self.provision_timeout,
        )
        .await
    }

    /// Run the one-shot session bootstrap in the background, sharing
    /// this client's jar and connection pool.
    pub fn spawn_token_bootstrap(&self) -> watch::Receiver<TokenState> {
        let cookies: Arc<dyn CookieSource> = self.jar.clone();
        spawn_token_bootstrap(
            self.http.clone(),
            cookies,
            self.base_url.clone(),
            self.provision_timeout,
        )
    }

    /// Authenticate against `api/method/login` with a form-encoded body,
    /// establishing the session cookies (and usually the CSRF cookie) in
    /// the shared jar. Returns the backend's login message.
    pub async fn login(&self, usr: &str, pwd: &Password) -> Result<String> {
        let response = self
            .execute(
                Method::POST,
                "api/method/login",
                &[],
                Payload::Form(vec![
                    ("usr".to_owned(), usr.to_owned()),
                    ("pwd".to_owned(), pwd.expose().to_owned()),
                ]),
            )
            .await?;
        let body: MessageEnvelope<String> = decode(response).await?;
        Ok(body.message)
    }

    /// `GET api/method/frappe.auth.get_logged_user`: the logged-in
    /// user's id.
    pub async fn logged_user(&self) -> Result<String> {
        let response = self
            .execute(Method::GET, LOGGED_USER_METHOD, &[], Payload::Empty)
            .await?;
        let body: MessageEnvelope<String> = decode(response).await?;
        Ok(body.message)
    }

    /// Call a whitelisted server method with `GET api/method/{method}`.
    pub async fn call_get<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let path = format!("api/method/{method}");
        let response = self
            .execute(Method::GET, &path, params, Payload::Empty)
            .await?;
        let body: MessageEnvelope<T> = decode(response).await?;
        Ok(body.message)
    }

    /// Call a whitelisted server method with a JSON body.
    pub async fn call_post<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let path = format!("api/method/{method}");
        let response = self
            .execute(Method::POST, &path, &[], json_payload(body)?)
            .await?;
        let envelope: MessageEnvelope<T> = decode(response).await?;
        Ok(envelope.message)
    }

    /// List documents of a doctype. `fields` become the JSON-array
    /// `fields` parameter; `limit` maps to `limit_page_length` (0 means
    /// "no limit" on this backend). Doctype names may contain spaces;
    /// they are percent-encoded on join.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        doctype: &str,
        fields: &[&str],
        limit: Option<u32>,
    ) -> Result<Vec<T>> {
        let path = format!("api/resource/{doctype}");
        let mut query: Vec<(&str, String)> = Vec::new();
        if !fields.is_empty() {
            let fields_json = serde_json::to_string(fields)
                .map_err(|e| Error::Encode(format!("encoding fields: {e}")))?;
            query.push(("fields", fields_json));
        }
        if let Some(limit) = limit {
            query.push(("limit_page_length", limit.to_string()));
        }
        let response = self
            .execute(Method::GET, &path, &query, Payload::Empty)
            .await?;
        let body: DataEnvelope<Vec<T>> = decode(response).await?;
        Ok(body.data)
    }

    /// Fetch a single document.
    pub async fn get_doc<T: DeserializeOwned>(&self, doctype: &str, name: &str) -> Result<T> {
        let path = format!("api/resource/{doctype}/{name}");
        let response = self
            .execute(Method::GET, &path, &[], Payload::Empty)
            .await?;
        let body: DataEnvelope<T> = decode(response).await?;
        Ok(body.data)
    }

    /// Create a document; returns the stored form.
    pub async fn insert<T: DeserializeOwned, B: Serialize>(
        &self,
        doctype: &str,
        doc: &B,
    ) -> Result<T> {
        let path = format!("api/resource/{doctype}");
        let response = self
            .execute(Method::POST, &path, &[], json_payload(doc)?)
            .await?;
        let body: DataEnvelope<T> = decode(response).await?;
        Ok(body.data)
    }

    /// Update fields on an existing document; returns the stored form.
    pub async fn update<T: DeserializeOwned, B: Serialize>(
        &self,
        doctype: &str,
        name: &str,
        patch: &B,
    ) -> Result<T> {
        let path = format!("api/resource/{doctype}/{name}");
        let response = self
            .execute(Method::PUT, &path, &[], json_payload(patch)?)
            .await?;
        let body: DataEnvelope<T> = decode(response).await?;
        Ok(body.data)
    }

    /// Delete a document.
    pub async fn delete_doc(&self, doctype: &str, name: &str) -> Result<()> {
        let path = format!("api/resource/{doctype}/{name}");
        self.execute(Method::DELETE, &path, &[], Payload::Empty)
            .await?;
        Ok(())
    }

    /// Upload a file through `api/method/upload_file` as multipart form
    /// data. The authorizer leaves content-type to the transport so the
    /// multipart boundary is set correctly.
    pub async fn upload_file(&self, upload: FileUpload) -> Result<FileRef> {
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(upload.content).file_name(upload.file_name),
            )
            .text("is_private", if upload.is_private { "1" } else { "0" });
        if let Some(doctype) = upload.doctype {
            form = form.text("doctype", doctype);
        }
        if let Some(docname) = upload.docname {
            form = form.text("docname", docname);
        }

        let response = self
            .execute(
                Method::POST,
                "api/method/upload_file",
                &[],
                Payload::Multipart(form),
            )
            .await?;
        let body: MessageEnvelope<FileRef> = decode(response).await?;
        Ok(body.message)
    }

    /// Build, authorize, and send a request, then classify non-success
    /// responses. The token comes from the cookie jar via the reader,
    /// never the provisioner, so sends are not blocked on provisioning.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Payload,
    ) -> Result<Response> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("invalid request path {path}: {e}")))?;

        let mut headers = HeaderMap::new();
        let token = self.csrf_token();
        apply_authorization(&mut headers, &token, payload.kind());

        let mut builder = self.http.request(method.clone(), url).headers(headers);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(bytes) => builder.body(bytes),
            Payload::Form(fields) => builder.form(&fields),
            Payload::Multipart(form) => builder.multipart(form),
        };

        debug!(request_id = %request_id, method = %method, path = %path, "sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(format!("{method} {path}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(request_id = %request_id, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match classify_status(status.as_u16(), &body) {
            Rejection::CsrfToken => {
                error!(
                    request_id = %request_id,
                    status = status.as_u16(),
                    "csrf token rejected by backend, session reload required"
                );
                Err(Error::TokenRejected(truncate_body(&body)))
            }
            Rejection::Generic => Err(Error::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            }),
        }
    }
}

/// Deserialize a successful response body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("reading response body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse(e.to_string()))
}
