//! Test doubles shared by the orchestrator tests.

use std::collections::VecDeque;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::SaveError;
use crate::http::{HttpClient, HttpRequest, HttpResponse, TransportError};
use crate::save::{SaveSink, StagedResource};

pub(crate) enum MockReply {
    Respond(HttpResponse),
    Fail(TransportError),
    /// Never answers; resolves to `Canceled` once the request token fires.
    Hang,
}

/// Scripted HTTP client. Replies are consumed in order; every request is
/// recorded.
pub(crate) struct MockHttp {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttp {
    pub(crate) fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub(crate) fn respond(status: u16, body: &str) -> MockReply {
    MockReply::Respond(HttpResponse::new(status, body.to_string()))
}

impl HttpClient for MockHttp {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + '_>> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.replies.lock().unwrap().pop_front();

        Box::pin(async move {
            match reply {
                Some(MockReply::Respond(resp)) => {
                    if let (Some(progress), Some(body)) =
                        (&request.on_upload_progress, &request.body)
                    {
                        let total = body.len() as u64;
                        progress(total / 2, Some(total));
                        progress(total, None);
                        progress(total, Some(total));
                    }
                    Ok(resp)
                }
                Some(MockReply::Fail(e)) => Err(e),
                Some(MockReply::Hang) => match request.cancel {
                    Some(token) => {
                        token.cancelled().await;
                        Err(TransportError::Canceled)
                    }
                    None => std::future::pending().await,
                },
                None => Err(TransportError::Network("no mock reply available".into())),
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkEvent {
    Staged { size: u64, content_type: String },
    Saved(String),
    Released,
}

/// Save sink that records what happened instead of touching disk.
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
    fail_save: bool,
}

impl RecordingSink {
    pub(crate) fn failing() -> Self {
        Self {
            fail_save: true,
            ..Default::default()
        }
    }

    pub(crate) fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SaveSink for RecordingSink {
    fn stage(&self, data: Bytes, content_type: &str) -> Result<StagedResource, SaveError> {
        self.events.lock().unwrap().push(SinkEvent::Staged {
            size: data.len() as u64,
            content_type: content_type.to_string(),
        });
        Ok(StagedResource {
            id: Uuid::new_v4(),
            content_type: content_type.to_string(),
            size: data.len() as u64,
        })
    }

    fn trigger_save(&self, _staged: &StagedResource, filename: &str) -> Result<PathBuf, SaveError> {
        if self.fail_save {
            return Err(SaveError::Io(std::io::Error::other("disk full")));
        }
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Saved(filename.to_string()));
        Ok(PathBuf::from(filename))
    }

    fn release(&self, _staged: StagedResource) {
        self.events.lock().unwrap().push(SinkEvent::Released);
    }
}
