//! [`HttpClient`] implementation on top of reqwest.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_LENGTH};
use reqwest::{Body, Client, RequestBuilder};
use tracing::trace;

use crate::http::{
    AuthContext, HttpClient, HttpRequest, HttpResponse, Method, TransportError, UploadProgressFn,
};

/// Upload bodies with a progress callback are streamed in chunks of this size.
const PROGRESS_CHUNK_SIZE: usize = 64 * 1024;

const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const SESSION_ID_HEADER: &str = "x-session-id";
const JSON_ACCEPT: &str = "application/json, */*";

/// reqwest-backed transport.
///
/// Credentialed requests carry the session headers, taken from the request
/// or, failing that, from the session this client was built with.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
    session: Option<AuthContext>,
}

impl ReqwestHttpClient {
    pub fn new(session: Option<AuthContext>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, session))
    }

    pub fn with_client(client: Client, session: Option<AuthContext>) -> Self {
        Self { client, session }
    }

    fn build(&self, request: HttpRequest) -> RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };
        let mut builder = self.client.request(method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if request.with_credentials {
            builder = builder.header(ACCEPT, JSON_ACCEPT);
            if let Some(auth) = request.auth.as_ref().or(self.session.as_ref()) {
                builder = builder
                    .header(AUTH_TOKEN_HEADER, &auth.token)
                    .header(SESSION_ID_HEADER, &auth.session_id);
            }
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = match request.on_upload_progress {
                Some(progress) => builder
                    .header(CONTENT_LENGTH, body.len())
                    .body(Body::wrap_stream(progress_stream(body, progress))),
                None => builder.body(body),
            };
        }
        builder
    }
}

async fn send(builder: RequestBuilder) -> Result<HttpResponse, TransportError> {
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().await.map_err(transport_error)?;
    trace!(status, len = body.len(), "response received");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Network(e.to_string())
    }
}

/// Splits `body` into chunks, reporting cumulative bytes as each one is
/// handed to the connection.
fn progress_stream(
    body: Bytes,
    progress: UploadProgressFn,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = body.len() as u64;
    let chunks: Vec<Bytes> = (0..body.len())
        .step_by(PROGRESS_CHUNK_SIZE)
        .map(|start| body.slice(start..(start + PROGRESS_CHUNK_SIZE).min(body.len())))
        .collect();

    let mut loaded = 0u64;
    futures_util::stream::iter(chunks).map(move |chunk| {
        loaded += chunk.len() as u64;
        progress(loaded, Some(total));
        Ok::<_, std::io::Error>(chunk)
    })
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let cancel = request.cancel.clone().unwrap_or_default();
            if cancel.is_cancelled() {
                return Err(TransportError::Canceled);
            }
            trace!(method = %request.method, url = %request.url, "sending request");
            let builder = self.build(request);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Canceled),
                result = send(builder) => result,
            }
        })
    }
}
