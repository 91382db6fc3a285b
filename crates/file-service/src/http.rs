//! HTTP transport seam.
//!
//! The orchestrators never talk to a concrete HTTP library. They build an
//! [`HttpRequest`] and hand it to an [`HttpClient`]; the production
//! implementation lives in [`crate::reqwest_client`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use filegate_protocol::ServerEnvelope;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Callback invoked as request body bytes are sent: `(loaded, total)`.
///
/// `total` is `None` when the transport cannot tell the body length.
pub type UploadProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Session credentials attached to credentialed requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub token: String,
    pub session_id: String,
}

impl AuthContext {
    pub fn new(token: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &"<redacted>")
            .field("session_id", &self.session_id)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
        };
        f.write_str(s)
    }
}

/// A request as the orchestrators describe it.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Attach session credentials and the JSON `Accept` header.
    pub with_credentials: bool,
    /// Explicit credentials; the client's session default is used when absent.
    pub auth: Option<AuthContext>,
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
    pub on_upload_progress: Option<UploadProgressFn>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            with_credentials: false,
            auth: None,
            timeout: None,
            cancel: None,
            on_upload_progress: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `value` as the JSON body and sets `Content-Type`.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(Bytes::from(body)))
    }

    pub fn credentials(mut self, auth: Option<AuthContext>) -> Self {
        self.with_credentials = true;
        self.auth = auth;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn on_upload_progress(mut self, progress: UploadProgressFn) -> Self {
        self.on_upload_progress = Some(progress);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("with_credentials", &self.with_credentials)
            .field("auth", &self.auth)
            .field("timeout", &self.timeout)
            .field("progress", &self.on_upload_progress.is_some())
            .finish()
    }
}

/// A response with any status code.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Parses the body as JSON. Returns `None` for non-JSON bodies.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// The `message` field of a JSON body, if any.
    pub fn server_message(&self) -> Option<String> {
        self.json()
            .map(|v| ServerEnvelope::from_value(&v))
            .and_then(|env| env.message)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// No response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request canceled")]
    Canceled,

    #[error("request timed out")]
    TimedOut,

    #[error("network error: {0}")]
    Network(String),
}

/// Abstract HTTP transport.
///
/// A response with any status code is `Ok`; `Err` means nothing came back.
/// Implementations honor `request.cancel` by resolving to
/// [`TransportError::Canceled`] once the token fires.
pub trait HttpClient: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_header_lookup_ignores_case() {
        let resp = HttpResponse::new(200, "").with_header("content-disposition", "attachment");
        assert_eq!(resp.header("Content-Disposition"), Some("attachment"));
        assert_eq!(resp.header("content-type"), None);
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(304, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
    }

    #[test]
    fn server_message_requires_json_body() {
        let json = HttpResponse::new(400, r#"{"message":"name too long"}"#);
        assert_eq!(json.server_message().as_deref(), Some("name too long"));

        let plain = HttpResponse::new(500, "DB save failed");
        assert_eq!(plain.server_message(), None);
        assert!(plain.json().is_none());
    }

    #[test]
    fn json_body_sets_content_type() {
        let req = HttpRequest::new(Method::Post, "https://api/files")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
    }

    #[test]
    fn credentials_flag_is_set() {
        let req = HttpRequest::new(Method::Head, "https://store/x")
            .credentials(Some(AuthContext::new("tok", "sess")));
        assert!(req.with_credentials);
        assert_eq!(req.auth.unwrap().session_id, "sess");
    }

    #[test]
    fn auth_debug_redacts_token() {
        let auth = AuthContext::new("secret-token", "sess");
        let out = format!("{auth:?}");
        assert!(!out.contains("secret-token"));
        assert!(out.contains("sess"));
    }
}
