//! Download: probe, fetch, save.

use std::sync::Arc;
use std::time::Duration;

use filegate_transfer::ErrorKind;
use tracing::{debug, info, warn};

use crate::classify::{Phase, status_message};
use crate::config::Endpoints;
use crate::disposition::filename_from_content_disposition;
use crate::error::{AuthExpired, SaveError};
use crate::http::{HttpClient, HttpRequest, HttpResponse, Method};
use crate::result::{DownloadedFile, Failure, TransferResult};
use crate::save::{SaveSink, StagedResource};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

type DownloadOutcome = Result<TransferResult<DownloadedFile>, AuthExpired>;

pub struct Downloader {
    http: Arc<dyn HttpClient>,
    sink: Arc<dyn SaveSink>,
    endpoints: Endpoints,
    timeout: Duration,
    release_delay: Duration,
}

impl Downloader {
    pub fn new(
        http: Arc<dyn HttpClient>,
        sink: Arc<dyn SaveSink>,
        endpoints: Endpoints,
        timeout: Duration,
        release_delay: Duration,
    ) -> Self {
        Self {
            http,
            sink,
            endpoints,
            timeout,
            release_delay,
        }
    }

    /// Downloads `filename` and hands it to the save sink.
    ///
    /// The saved name comes from `Content-Disposition` when present,
    /// otherwise `display_name`. A 401 at any step is raised as
    /// [`AuthExpired`]; everything else is a [`TransferResult::Failure`].
    pub async fn download(&self, filename: &str, display_name: &str) -> DownloadOutcome {
        if filename.is_empty() {
            return Ok(Failure::new(ErrorKind::NoFile, "No file selected.").into());
        }
        let url = self.endpoints.file_url(filename, false);
        info!(file = %filename, url = %url, "download started");

        if let Err(outcome) = self.probe(&url).await {
            return outcome;
        }

        let request = HttpRequest::new(Method::Get, &url)
            .credentials(None)
            .timeout(self.timeout);
        let response = match self.http.execute(request).await {
            Ok(resp) => resp,
            Err(e) => {
                let failure = Failure::from_transport(e, Phase::Download);
                warn!(file = %filename, kind = ?failure.kind, "download failed: {}", failure.message);
                return Ok(failure.into());
            }
        };
        if response.status == 401 {
            warn!(file = %filename, "download rejected: session expired");
            return Err(AuthExpired);
        }
        if !response.is_success() {
            let failure = Failure::from_status(&response, Phase::Download);
            warn!(file = %filename, status = response.status, "download failed: {}", failure.message);
            return Ok(failure.into());
        }

        let save_as = response
            .header("content-disposition")
            .and_then(filename_from_content_disposition)
            .unwrap_or_else(|| match display_name {
                "" => filename.to_string(),
                name => name.to_string(),
            });
        Ok(self.save(response, save_as).await)
    }

    /// HEAD request; only a 200 lets the download proceed.
    async fn probe(&self, url: &str) -> Result<(), DownloadOutcome> {
        let request = HttpRequest::new(Method::Head, url)
            .credentials(None)
            .timeout(self.timeout);
        let response = match self.http.execute(request).await {
            Ok(resp) => resp,
            Err(e) => return Err(Ok(Failure::from_transport(e, Phase::Download).into())),
        };
        debug!(url = %url, status = response.status, "download probe");

        let failure = match response.status {
            200 => return Ok(()),
            401 => return Err(Err(AuthExpired)),
            404 => Failure::new(ErrorKind::NotFound, status_message(404)),
            403 => Failure::new(ErrorKind::Forbidden, status_message(403)),
            status => Failure::new(ErrorKind::Unknown, "Download preparation failed.")
                .retryable(Failure::from_status(&response, Phase::Download).retryable)
                .with_cause(format!("probe returned {status}")),
        };
        Err(Ok(failure.into()))
    }

    async fn save(&self, response: HttpResponse, save_as: String) -> TransferResult<DownloadedFile> {
        let content_type = response
            .header("content-type")
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let size_bytes = response.body.len() as u64;

        let sink = Arc::clone(&self.sink);
        let name = save_as.clone();
        let ct = content_type.clone();
        let saved = tokio::task::spawn_blocking(move || -> Result<_, SaveError> {
            let staged = sink.stage(response.body, &ct)?;
            match sink.trigger_save(&staged, &name) {
                Ok(path) => Ok((staged, path)),
                Err(e) => {
                    sink.release(staged);
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| SaveError::Join(e.to_string()))
        .and_then(|r| r);

        match saved {
            Ok((staged, saved_to)) => {
                self.schedule_release(staged);
                info!(file = %save_as, size = size_bytes, path = %saved_to.display(), "download saved");
                TransferResult::Success(DownloadedFile {
                    filename: save_as,
                    content_type,
                    size_bytes,
                    saved_to,
                })
            }
            Err(e) => {
                warn!(file = %save_as, error = %e, "failed to save download");
                Failure::new(ErrorKind::Unknown, "Could not save the downloaded file.")
                    .with_cause(e)
                    .into()
            }
        }
    }

    /// Releases the staged resource after the configured delay.
    fn schedule_release(&self, staged: StagedResource) {
        let sink = Arc::clone(&self.sink);
        let delay = self.release_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(id = %staged.id, "releasing staged download");
            sink.release(staged);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, TransportError};
    use crate::testing::{MockHttp, MockReply, RecordingSink, SinkEvent, respond};

    fn downloader(http: Arc<MockHttp>, sink: Arc<RecordingSink>) -> Downloader {
        Downloader::new(
            http,
            sink,
            Endpoints::new("https://api", "https://store"),
            Duration::from_secs(30),
            Duration::from_millis(100),
        )
    }

    fn file_reply(body: &str, disposition: Option<&str>) -> MockReply {
        let mut resp = HttpResponse::new(200, body.to_string()).with_header("content-type", "application/pdf");
        if let Some(d) = disposition {
            resp = resp.with_header("Content-Disposition", d);
        }
        MockReply::Respond(resp)
    }

    #[tokio::test(start_paused = true)]
    async fn saves_under_disposition_name_and_releases_later() {
        let http = Arc::new(MockHttp::new(vec![
            respond(200, ""),
            file_reply("%PDF-1.7", Some("attachment; filename*=UTF-8''q3%20report.pdf")),
        ]));
        let sink = Arc::new(RecordingSink::default());
        let dl = downloader(http.clone(), sink.clone());

        let result = dl.download("abc.pdf", "Report").await.unwrap();

        let file = result.success().unwrap();
        assert_eq!(file.filename, "q3 report.pdf");
        assert_eq!(file.content_type, "application/pdf");
        assert_eq!(file.size_bytes, 8);

        let requests = http.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Head);
        assert_eq!(requests[0].url, "https://store/download/abc.pdf");
        assert!(requests[0].with_credentials);
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(30)));
        assert_eq!(requests[1].method, Method::Get);
        assert!(requests[1].with_credentials);
        assert_eq!(requests[1].timeout, Some(Duration::from_secs(30)));

        // Saved but not yet released.
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Staged {
                    size: 8,
                    content_type: "application/pdf".into()
                },
                SinkEvent::Saved("q3 report.pdf".into()),
            ]
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        tokio::task::yield_now().await;
        assert_eq!(sink.events().last(), Some(&SinkEvent::Released));
    }

    #[tokio::test]
    async fn falls_back_to_display_name() {
        let http = Arc::new(MockHttp::new(vec![respond(200, ""), file_reply("x", None)]));
        let sink = Arc::new(RecordingSink::default());

        let result = downloader(http, sink.clone())
            .download("abc.pdf", "Contract.pdf")
            .await
            .unwrap();

        assert_eq!(result.success().unwrap().filename, "Contract.pdf");
        assert!(sink.events().contains(&SinkEvent::Saved("Contract.pdf".into())));
    }

    #[tokio::test]
    async fn probe_not_found_skips_fetch() {
        let http = Arc::new(MockHttp::new(vec![respond(404, "")]));
        let sink = Arc::new(RecordingSink::default());

        let result = downloader(http.clone(), sink.clone())
            .download("missing.pdf", "missing.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::NotFound);
        assert_eq!(failure.message, "File not found.");
        assert_eq!(http.requests().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn probe_forbidden() {
        let http = Arc::new(MockHttp::new(vec![respond(403, "")]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("secret.pdf", "secret.pdf")
            .await
            .unwrap();

        assert_eq!(result.failure().unwrap().kind, ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn probe_other_status_is_preparation_failure() {
        let http = Arc::new(MockHttp::new(vec![respond(502, "")]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.message, "Download preparation failed.");
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn probe_401_raises_auth_expired() {
        let http = Arc::new(MockHttp::new(vec![respond(401, "")]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await;

        assert_eq!(result, Err(AuthExpired));
    }

    #[tokio::test]
    async fn fetch_401_raises_auth_expired() {
        let http = Arc::new(MockHttp::new(vec![respond(200, ""), respond(401, "")]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await;

        assert_eq!(result, Err(AuthExpired));
    }

    #[tokio::test]
    async fn probe_timeout_skips_fetch() {
        let http = Arc::new(MockHttp::new(vec![MockReply::Fail(TransportError::TimedOut)]));
        let result = downloader(http.clone(), Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Timeout);
        assert!(failure.retryable);
        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn fetch_timeout_is_retryable() {
        let http = Arc::new(MockHttp::new(vec![
            respond(200, ""),
            MockReply::Fail(TransportError::TimedOut),
        ]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.kind, ErrorKind::Timeout);
        assert_eq!(failure.message, "File download timed out.");
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn fetch_error_status_is_classified() {
        let http = Arc::new(MockHttp::new(vec![
            respond(200, ""),
            respond(503, r#"{"message":"maintenance"}"#),
        ]));
        let result = downloader(http, Arc::new(RecordingSink::default()))
            .download("a.pdf", "a.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.message, "maintenance");
        assert!(failure.retryable);
    }

    #[tokio::test]
    async fn save_failure_releases_immediately() {
        let http = Arc::new(MockHttp::new(vec![respond(200, ""), file_reply("x", None)]));
        let sink = Arc::new(RecordingSink::failing());

        let result = downloader(http, sink.clone())
            .download("a.pdf", "a.pdf")
            .await
            .unwrap();

        let failure = result.failure().unwrap();
        assert_eq!(failure.message, "Could not save the downloaded file.");
        assert_eq!(sink.events().last(), Some(&SinkEvent::Released));
    }

    #[tokio::test]
    async fn empty_filename_makes_no_requests() {
        let http = Arc::new(MockHttp::new(vec![]));
        let result = downloader(http.clone(), Arc::new(RecordingSink::default()))
            .download("", "x")
            .await
            .unwrap();

        assert_eq!(result.failure().unwrap().kind, ErrorKind::NoFile);
        assert!(http.requests().is_empty());
    }
}
