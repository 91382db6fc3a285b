//! Two-phase upload: object store PUT, then metadata registration.

use std::sync::Arc;

use filegate_protocol::{MetadataRequest, PartialFileDescriptor, ServerEnvelope};
use filegate_transfer::{
    ErrorKind, LocalFile, TransferError, TransferHandle, TransferRegistry, ValidationOutcome,
    Validator,
};
use tracing::{debug, info, warn};

use crate::classify::{FailureSignal, Phase, classify};
use crate::config::Endpoints;
use crate::error::AuthExpired;
use crate::http::{AuthContext, HttpClient, HttpRequest, Method, TransportError};
use crate::normalize::normalize;
use crate::result::{Failure, TransferResult, UploadedFile};

/// Receives upload progress as an integer percentage.
pub type ProgressFn = Arc<dyn Fn(u32) + Send + Sync>;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

type UploadOutcome = Result<TransferResult<UploadedFile>, AuthExpired>;

/// Drives uploads. Cheap to share behind an `Arc`.
pub struct Uploader {
    http: Arc<dyn HttpClient>,
    tracker: Arc<dyn TransferRegistry>,
    validator: Validator,
    endpoints: Endpoints,
}

impl Uploader {
    pub fn new(
        http: Arc<dyn HttpClient>,
        tracker: Arc<dyn TransferRegistry>,
        validator: Validator,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            http,
            tracker,
            validator,
            endpoints,
        }
    }

    /// Uploads `file` under `upload/{logical_name}/{file name}`.
    ///
    /// Every failure is returned as [`TransferResult::Failure`] except an
    /// expired session (a 401 from either phase), which is raised as
    /// [`AuthExpired`]. The tracker entry for the file name is removed on
    /// every exit path.
    pub async fn upload(
        &self,
        file: &LocalFile,
        on_progress: Option<ProgressFn>,
        auth: &AuthContext,
        logical_name: &str,
    ) -> UploadOutcome {
        if let ValidationOutcome::Rejected { kind, message } =
            self.validator.validate(Some(&file.info))
        {
            return Ok(Failure::new(kind, message).into());
        }

        let object_key = Endpoints::object_key(logical_name, file.name());
        let object_url = self.endpoints.object_url(&object_key);

        let handle = match self.tracker.register(file.name()) {
            Ok(handle) => handle,
            Err(TransferError::AlreadyActive(key)) => {
                debug!(key = %key, "upload already in progress");
                return Ok(Failure::new(
                    ErrorKind::InProgress,
                    "An upload with this name is already in progress.",
                )
                .into());
            }
            Err(e) => {
                return Ok(Failure::new(ErrorKind::Unknown, e.to_string()).into());
            }
        };

        info!(file = %file.name(), key = %object_key, size = file.size(), "upload started");
        let outcome = self
            .run(&handle, file, on_progress, auth, object_key, object_url)
            .await;
        self.tracker.deregister(&handle);

        match &outcome {
            Ok(TransferResult::Success(uploaded)) => {
                info!(file = %file.name(), url = %uploaded.object_url, "upload complete");
            }
            Ok(TransferResult::Failure(f)) => {
                warn!(file = %file.name(), kind = ?f.kind, cause = ?f.cause, "upload failed: {}", f.message);
            }
            Err(_) => warn!(file = %file.name(), "upload rejected: session expired"),
        }
        outcome
    }

    async fn run(
        &self,
        handle: &TransferHandle,
        file: &LocalFile,
        on_progress: Option<ProgressFn>,
        auth: &AuthContext,
        object_key: String,
        object_url: String,
    ) -> UploadOutcome {
        if let Err(outcome) = self.put_object(handle, file, on_progress, &object_url).await {
            return outcome;
        }
        self.tracker.deregister(handle);

        let request = MetadataRequest {
            url: object_url.clone(),
            mimetype: file.mime_type().to_string(),
            size: file.size(),
        };
        let payload = match self.register_metadata(&request, auth).await {
            Ok(payload) => payload,
            Err(outcome) => return outcome,
        };

        let fallback = PartialFileDescriptor {
            id: Some(object_key.clone()),
            url: Some(object_url),
            original_filename: Some(file.name().to_string()),
            mimetype: Some(file.mime_type().to_string()),
            size_bytes: Some(file.size()),
            ..Default::default()
        };
        let descriptor = normalize(&payload, &fallback).filter(|d| d.is_usable());

        Ok(match descriptor {
            Some(file) => TransferResult::Success(UploadedFile {
                object_url: file.url.clone(),
                object_key,
                file,
            }),
            None => Failure::new(ErrorKind::Unknown, "Could not retrieve uploaded file info.").into(),
        })
    }

    /// PUTs the raw bytes. `Err` carries the finished outcome when the
    /// upload cannot continue.
    async fn put_object(
        &self,
        handle: &TransferHandle,
        file: &LocalFile,
        on_progress: Option<ProgressFn>,
        object_url: &str,
    ) -> Result<(), UploadOutcome> {
        let token = handle.token().clone();
        let content_type = match file.mime_type() {
            "" => DEFAULT_CONTENT_TYPE,
            mime => mime,
        };

        let mut request = HttpRequest::new(Method::Put, object_url)
            .header("Content-Type", content_type)
            .body(file.data.clone())
            .cancel_token(token.clone());
        if let Some(cb) = on_progress {
            request = request.on_upload_progress(Arc::new(move |loaded: u64, total: Option<u64>| {
                if let Some(total) = total.filter(|t| *t > 0) {
                    cb(percent(loaded, total));
                }
            }));
        }

        if token.is_cancelled() {
            return Err(canceled());
        }
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => Err(TransportError::Canceled),
            r = self.http.execute(request) => r,
        };
        if token.is_cancelled() {
            return Err(canceled());
        }

        match response {
            Ok(resp) if resp.is_success() => {
                debug!(url = %object_url, status = resp.status, "object stored");
                Ok(())
            }
            Ok(resp) if resp.status == 401 => {
                warn!(url = %object_url, "object store rejected credentials");
                Err(Err(AuthExpired))
            }
            Ok(resp) => {
                let signal = FailureSignal::Status {
                    status: resp.status,
                    server_message: None,
                };
                let classified = classify(&signal, Phase::Upload);
                Err(fail(
                    Failure::new(classified.kind, "Object storage upload failed.")
                        .retryable(classified.retryable)
                        .with_cause(format!("object store returned {}", resp.status)),
                ))
            }
            Err(e) => Err(fail(Failure::from_transport(e, Phase::Upload))),
        }
    }

    /// POSTs the metadata record. Returns the JSON payload on success.
    async fn register_metadata(
        &self,
        request: &MetadataRequest,
        auth: &AuthContext,
    ) -> Result<serde_json::Value, UploadOutcome> {
        let http_request = match HttpRequest::new(Method::Post, self.endpoints.metadata_url())
            .credentials(Some(auth.clone()))
            .json(request)
        {
            Ok(req) => req,
            Err(e) => {
                return Err(fail(
                    Failure::new(ErrorKind::Unknown, "Failed to save file info.").with_cause(e),
                ));
            }
        };

        let response = match self.http.execute(http_request).await {
            Ok(resp) => resp,
            Err(e) => return Err(fail(Failure::from_transport(e, Phase::Upload))),
        };
        if response.status == 401 {
            return Err(Err(AuthExpired));
        }
        if !response.is_success() {
            return Err(fail(Failure::from_status(&response, Phase::Upload)));
        }

        let Some(payload) = response.json() else {
            return Err(fail(
                Failure::new(ErrorKind::Unknown, "Failed to save file info.")
                    .with_cause("metadata response is not JSON"),
            ));
        };
        let envelope = ServerEnvelope::from_value(&payload);
        if envelope.is_rejected() {
            let signal = FailureSignal::Rejected {
                server_message: envelope.message,
            };
            return Err(fail(Failure::from(classify(&signal, Phase::Upload))));
        }
        Ok(payload)
    }
}

fn fail(failure: Failure) -> UploadOutcome {
    Ok(TransferResult::Failure(failure))
}

fn canceled() -> UploadOutcome {
    fail(Failure::new(ErrorKind::Canceled, Phase::Upload.canceled_message()))
}

fn percent(loaded: u64, total: u64) -> u32 {
    ((loaded as f64 * 100.0) / total as f64).round() as u32
}
