//! Client-side file transfer service.
//!
//! Uploads go through two phases: the raw bytes are PUT to an object
//! store, then the resulting URL is registered with a metadata server
//! whose answer is normalized into a [`FileDescriptor`]. Downloads probe
//! the object first, fetch it, and hand it to a [`SaveSink`].
//!
//! Every operation resolves to a [`TransferResult`]; the only condition
//! raised as an error is [`AuthExpired`], which callers must answer by
//! re-authenticating.
//!
//! The HTTP transport, notifications and the save target are
//! collaborators behind traits, so the orchestration can be exercised
//! without a network.

pub mod classify;
pub mod config;
pub mod disposition;
pub mod download;
pub mod error;
pub mod http;
pub mod normalize;
pub mod reqwest_client;
pub mod result;
pub mod save;
pub mod service;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{Classified, FailureSignal, Phase, classify, is_retryable, status_message};
pub use config::{Endpoints, FileTypeConfig, ServiceConfig};
pub use download::Downloader;
pub use error::{AuthExpired, ConfigError, SaveError};
pub use http::{AuthContext, HttpClient, HttpRequest, HttpResponse, Method, TransportError};
pub use normalize::{UnwrapStrategy, normalize};
pub use reqwest_client::ReqwestHttpClient;
pub use result::{DownloadedFile, Failure, PreviewSource, TransferResult, UploadedFile};
pub use save::{DirectorySaveSink, SaveSink, StagedResource};
pub use service::FileService;
pub use upload::{ProgressFn, Uploader};

pub use filegate_protocol::FileDescriptor;
pub use filegate_transfer::{
    CancelAllOutcome, CancelOutcome, ErrorKind, FileInfo, LocalFile, SizeScope, TransferRegistry,
    TransferTracker, TypeRegistry, ValidationOutcome, format_file_size,
};
