//! The [`FileService`] facade.

use std::sync::Arc;

use filegate_notify::Notifier;
use filegate_protocol::{FileDescriptor, PartialFileDescriptor, ServerEnvelope};
use filegate_transfer::{
    CancelAllOutcome, CancelOutcome, ErrorKind, FileInfo, LocalFile, TransferRegistry,
    TransferTracker, TypeRegistry, ValidationOutcome, Validator,
};
use tracing::{info, warn};

use crate::classify::{FailureSignal, Phase, classify};
use crate::config::{Endpoints, ServiceConfig};
use crate::download::Downloader;
use crate::error::{AuthExpired, ConfigError};
use crate::http::{AuthContext, HttpClient, HttpRequest, Method};
use crate::normalize::normalize;
use crate::result::{DownloadedFile, Failure, PreviewSource, TransferResult, UploadedFile};
use crate::save::SaveSink;
use crate::upload::{ProgressFn, Uploader};

/// Entry point for validation, uploads, downloads and cancellation.
pub struct FileService {
    http: Arc<dyn HttpClient>,
    notifier: Arc<dyn Notifier>,
    tracker: Arc<dyn TransferRegistry>,
    validator: Validator,
    endpoints: Endpoints,
    uploader: Uploader,
    downloader: Downloader,
}

impl FileService {
    /// Builds a service with its own [`TransferTracker`].
    pub fn new(
        config: &ServiceConfig,
        http: Arc<dyn HttpClient>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn SaveSink>,
    ) -> Result<Self, ConfigError> {
        Self::with_tracker(config, http, notifier, sink, Arc::new(TransferTracker::new()))
    }

    pub fn with_tracker(
        config: &ServiceConfig,
        http: Arc<dyn HttpClient>,
        notifier: Arc<dyn Notifier>,
        sink: Arc<dyn SaveSink>,
        tracker: Arc<dyn TransferRegistry>,
    ) -> Result<Self, ConfigError> {
        let registry = Arc::new(config.type_registry()?);
        let validator = Validator::new(registry, Arc::clone(&notifier));
        let endpoints = config.endpoints();

        let uploader = Uploader::new(
            Arc::clone(&http),
            Arc::clone(&tracker),
            validator.clone(),
            endpoints.clone(),
        );
        let downloader = Downloader::new(
            Arc::clone(&http),
            sink,
            endpoints.clone(),
            config.download_timeout(),
            config.release_delay(),
        );

        Ok(Self {
            http,
            notifier,
            tracker,
            validator,
            endpoints,
            uploader,
            downloader,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.validator.registry()
    }

    /// Checks `file` against the configured rules. Rejections are also
    /// pushed to the notifier.
    pub fn validate(&self, file: Option<&FileInfo>) -> ValidationOutcome {
        self.validator.validate(file)
    }

    /// Uploads `file` under `upload/{logical_name}/{file name}`.
    pub async fn upload(
        &self,
        file: &LocalFile,
        on_progress: Option<ProgressFn>,
        auth: &AuthContext,
        logical_name: &str,
    ) -> Result<TransferResult<UploadedFile>, AuthExpired> {
        let result = self
            .uploader
            .upload(file, on_progress, auth, logical_name)
            .await?;
        if result.is_success() {
            self.notifier.success("File uploaded.");
        }
        Ok(result)
    }

    /// Downloads `filename`, saving it as the server-provided name or
    /// `display_name`.
    pub async fn download(
        &self,
        filename: &str,
        display_name: &str,
    ) -> Result<TransferResult<DownloadedFile>, AuthExpired> {
        let result = self.downloader.download(filename, display_name).await?;
        if result.is_success() {
            self.notifier.success("File downloaded.");
        }
        Ok(result)
    }

    /// Fetches the metadata record for `file_id`.
    pub async fn file_info(
        &self,
        file_id: &str,
    ) -> Result<TransferResult<FileDescriptor>, AuthExpired> {
        let request =
            HttpRequest::new(Method::Get, self.endpoints.file_info_url(file_id)).credentials(None);
        let response = match self.http.execute(request).await {
            Ok(resp) => resp,
            Err(e) => return Ok(Failure::from_transport(e, Phase::Download).into()),
        };
        if response.status == 401 {
            warn!(file_id, "file info rejected: session expired");
            return Err(AuthExpired);
        }
        if !response.is_success() {
            return Ok(Failure::from_status(&response, Phase::Download).into());
        }

        let Some(payload) = response.json() else {
            return Ok(Failure::new(ErrorKind::Unknown, "Could not retrieve file info.")
                .with_cause("file info response is not JSON")
                .into());
        };
        let envelope = ServerEnvelope::from_value(&payload);
        if envelope.is_rejected() {
            let signal = FailureSignal::Rejected {
                server_message: envelope.message,
            };
            return Ok(Failure::from(classify(&signal, Phase::Download)).into());
        }

        let fallback = PartialFileDescriptor {
            id: Some(file_id.to_string()),
            ..Default::default()
        };
        Ok(match normalize(&payload, &fallback).filter(FileDescriptor::is_usable) {
            Some(file) => TransferResult::Success(file),
            None => Failure::new(ErrorKind::Unknown, "Could not retrieve file info.").into(),
        })
    }

    /// Cancels the in-flight upload registered under `key`.
    pub fn cancel_upload(&self, key: &str) -> CancelOutcome {
        let outcome = self.tracker.cancel(key);
        info!(key, ok = outcome.ok, "cancel upload");
        outcome
    }

    pub fn cancel_all_uploads(&self) -> CancelAllOutcome {
        self.tracker.cancel_all()
    }

    pub fn is_uploading(&self, key: &str) -> bool {
        self.tracker.is_active(key)
    }

    /// Download (or preview) URL for a stored file name.
    pub fn file_url(&self, filename: &str, for_preview: bool) -> String {
        self.endpoints.file_url(filename, for_preview)
    }

    /// The recorded URL, else the object-store URL, else a preview URL
    /// from the stored file name. Empty when none is known.
    pub fn preview_url<P: PreviewSource + ?Sized>(&self, file: &P) -> String {
        let url = [file.recorded_url(), file.object_url()]
            .into_iter()
            .flatten()
            .find(|url| !url.is_empty());
        if let Some(url) = url {
            return url.to_string();
        }
        file.stored_filename()
            .map(|name| self.file_url(name, true))
            .unwrap_or_default()
    }

    /// Category of `filename` by extension, or `"unknown"`.
    pub fn file_type<'a>(&'a self, filename: &str) -> &'a str {
        self.registry().file_type(filename)
    }
}
