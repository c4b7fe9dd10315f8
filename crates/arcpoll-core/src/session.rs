//! Download session
//!
//! Owns one poller together with the archive frame it loads archives into.
//! Everything the poller needs is passed in here instead of living in
//! process-wide state.

use std::sync::Arc;
use std::time::Duration;

use arcpoll_download::{
    ArchiveDownload, ArchiveFrame, DownloadError, DownloadPoller, DownloadView, StatusClient,
};

use crate::config::Config;
use crate::Result;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DownloadSession {
    config: Config,
    poller: DownloadPoller,
    frame: ArchiveFrame,
}

impl DownloadSession {
    /// Build a session rendering into `view`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Config, view: Arc<dyn DownloadView>) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.download_dir)?;

        let client = StatusClient::with_timeout(config.endpoint()?, config.request_timeout())?;

        // Archives can be large, so only the connect phase is bounded.
        let archive_http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(DownloadError::from)?;
        let frame = ArchiveFrame::new(archive_http, config.download_dir.clone());

        let poller = DownloadPoller::new(
            config.poller_config(),
            client,
            view,
            Arc::new(frame.clone()),
        );

        tracing::info!(
            context = %config.context,
            download_dir = %config.download_dir.display(),
            "Download session ready"
        );

        Ok(Self {
            config,
            poller,
            frame,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn poller(&self) -> &DownloadPoller {
        &self.poller
    }

    pub fn frame(&self) -> &ArchiveFrame {
        &self.frame
    }

    /// Wait until the archive currently loaded into the frame is saved,
    /// fails or is cancelled. Returns `None` if nothing was loaded.
    pub async fn wait_for_archive(&self) -> Option<ArchiveDownload> {
        let mut current = self.frame.subscribe();
        let finished = current
            .wait_for(|d| d.as_ref().map_or(true, |d| d.state.is_finished()))
            .await
            .ok()?;
        finished.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcpoll_download::{ArchiveDownloadState, DownloadRequest, InfoRegion, PollOutcome};
    use httpmock::prelude::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LastInfoView {
        last: Mutex<Option<InfoRegion>>,
    }

    impl DownloadView for LastInfoView {
        fn render_info(&self, info: InfoRegion) {
            *self.last.lock().unwrap() = Some(info);
        }

        fn show_popup(&self) {}

        fn hide_popup(&self) {}
    }

    fn config_for(server: &MockServer, dir: &std::path::Path) -> Config {
        let mut config = Config::new(server.url("/zmd"));
        config.download_dir = dir.to_path_buf();
        config.poll_interval_ms = 100;
        config
    }

    #[tokio::test]
    async fn test_ready_then_download() {
        let server = MockServer::start_async().await;
        let status = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/zmd/download")
                    .query_param("requestId", "R9");
                then.status(200).body("ready");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let view = Arc::new(LastInfoView::default());
        let session = DownloadSession::new(config_for(&server, dir.path()), view.clone()).unwrap();

        let outcome = session
            .poller()
            .poll(&DownloadRequest::new("A1", "2", "R9"))
            .await;
        assert_eq!(outcome, PollOutcome::Ready);

        status.delete_async().await;
        let archive = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/zmd/download")
                    .query_param("objectId", "A1")
                    .query_param("version", "2");
                then.status(200)
                    .header("Content-Disposition", "filename=A1.zip")
                    .body("zip");
            })
            .await;

        let link = match view.last.lock().unwrap().clone() {
            Some(InfoRegion::Link(link)) => link,
            other => panic!("expected ready link, got {other:?}"),
        };
        link.activate(session.poller());

        let download = session.wait_for_archive().await.unwrap();
        archive.assert_async().await;

        assert_eq!(download.state, ArchiveDownloadState::Completed);
        assert_eq!(std::fs::read(dir.path().join("A1.zip")).unwrap(), b"zip");
    }

    #[tokio::test]
    async fn test_nothing_loaded() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let session = DownloadSession::new(
            config_for(&server, dir.path()),
            Arc::new(LastInfoView::default()),
        )
        .unwrap();

        assert!(session.wait_for_archive().await.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = Config::new("not a url");
        config.download_dir = std::env::temp_dir();

        let result = DownloadSession::new(config, Arc::new(LastInfoView::default()));
        assert!(result.is_err());
    }
}
