//! Download poller
//!
//! Drives one polling sequence at a time: ask the server whether the archive
//! is ready, render the matching popup state, and re-arm the poll timer while
//! the archive is still being prepared. The timer is a tokio task owned by the
//! poller; at most one is pending at any instant.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::StatusClient;
use crate::frame::DownloadFrame;
use crate::request::{ArchiveId, DownloadRequest};
use crate::status::{ArchiveStatus, PollState};
use crate::view::{DownloadView, InfoRegion, ReadyLink};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Texts rendered into the popup's info region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub wait: String,
    pub ready: String,
    pub error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            wait: "The archive is being prepared, please wait...".to_string(),
            ready: "Download the archive".to_string(),
            error: "The archive could not be prepared.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub messages: Messages,
    /// Delay between a pending answer and the next status request
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            messages: Messages::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// What a single [`DownloadPoller::poll`] call led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Archive ready, link rendered
    Ready,
    /// Still preparing, next poll scheduled
    Pending,
    /// Status request failed, error rendered
    Failed,
    /// Popup was hidden while the request was in flight; nothing rendered
    Abandoned,
}

struct PendingPoll {
    ticket: u64,
    request_id: String,
    handle: JoinHandle<()>,
}

struct PollerInner {
    config: PollerConfig,
    client: StatusClient,
    view: Arc<dyn DownloadView>,
    frame: Arc<dyn DownloadFrame>,
    timer: Mutex<Option<PendingPoll>>,
    next_ticket: AtomicU64,
    /// Advanced on every popup hide; polls started in an older epoch are dropped.
    epoch: watch::Sender<u64>,
    /// Held while a poll response is rendered and while the popup is hidden,
    /// so a response never lands after the hide that outdated it.
    render: Mutex<()>,
    state: watch::Sender<PollState>,
}

/// Cheap to clone; clones share the timer, view and frame.
#[derive(Clone)]
pub struct DownloadPoller {
    inner: Arc<PollerInner>,
}

impl DownloadPoller {
    pub fn new(
        config: PollerConfig,
        client: StatusClient,
        view: Arc<dyn DownloadView>,
        frame: Arc<dyn DownloadFrame>,
    ) -> Self {
        let (epoch, _) = watch::channel(0);
        let (state, _) = watch::channel(PollState::Idle);

        Self {
            inner: Arc::new(PollerInner {
                config,
                client,
                view,
                frame,
                timer: Mutex::new(None),
                next_ticket: AtomicU64::new(0),
                epoch,
                render: Mutex::new(()),
                state,
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> PollState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    /// Returns true while a scheduled poll has not fired yet
    pub fn has_pending_poll(&self) -> bool {
        self.inner.timer.lock().is_some()
    }

    /// Load the archive into the download frame, replacing whatever it held.
    pub fn download_archive(&self, archive: &ArchiveId) {
        let url = self.inner.client.endpoint().archive_url(archive);

        tracing::info!(
            object_id = %archive.object_id,
            version = %archive.version,
            "Downloading archive"
        );

        self.inner.frame.clear();
        self.inner.frame.load(url);
    }

    /// Ask the server once whether the archive is ready and render the answer.
    ///
    /// A pending answer re-arms the timer through [`Self::download_wait`].
    pub async fn poll(&self, request: &DownloadRequest) -> PollOutcome {
        let epoch = *self.inner.epoch.borrow();
        self.poll_in_epoch(request, epoch).await
    }

    async fn poll_in_epoch(&self, request: &DownloadRequest, started: u64) -> PollOutcome {
        let mut epoch = self.inner.epoch.subscribe();
        let current = *epoch.borrow_and_update();
        if current != started {
            return self.abandon(request);
        }

        let result = tokio::select! {
            result = self.inner.client.check(request) => result,
            _ = epoch.changed() => return self.abandon(request),
        };

        let _render = self.inner.render.lock();
        if *self.inner.epoch.borrow() != started {
            return self.abandon(request);
        }

        match result {
            Ok(ArchiveStatus::Ready) => {
                tracing::info!(
                    object_id = %request.archive.object_id,
                    request_id = %request.request_id,
                    "Archive ready"
                );
                self.download_ready(request.archive.clone());
                PollOutcome::Ready
            }
            Ok(ArchiveStatus::Pending) => {
                tracing::debug!(request_id = %request.request_id, "Archive still being prepared");
                self.download_wait(request.clone());
                PollOutcome::Pending
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request.request_id,
                    error = %e,
                    "Archive status request failed"
                );
                self.download_error();
                PollOutcome::Failed
            }
        }
    }

    fn abandon(&self, request: &DownloadRequest) -> PollOutcome {
        tracing::debug!(
            request_id = %request.request_id,
            "Popup hidden, dropping status response"
        );
        PollOutcome::Abandoned
    }

    /// Render the wait message and schedule the next poll.
    pub fn download_wait(&self, request: DownloadRequest) {
        self.cancel_timer();
        self.inner.view.render_info(InfoRegion::Message {
            text: self.inner.config.messages.wait.clone(),
        });
        self.show_popup();
        self.schedule_poll(request);
        self.set_state(PollState::Wait);
    }

    /// Render the link that downloads `archive`.
    pub fn download_ready(&self, archive: ArchiveId) {
        self.cancel_timer();
        self.inner.view.render_info(InfoRegion::Empty);
        self.inner.view.render_info(InfoRegion::Link(ReadyLink {
            label: self.inner.config.messages.ready.clone(),
            archive,
        }));
        self.show_popup();
        self.set_state(PollState::Ready);
    }

    pub fn download_error(&self) {
        self.cancel_timer();
        self.inner.view.render_info(InfoRegion::Message {
            text: self.inner.config.messages.error.clone(),
        });
        self.show_popup();
        self.set_state(PollState::Error);
    }

    pub fn show_popup(&self) {
        self.inner.view.show_popup();
    }

    /// Hide the popup and end the running sequence: the pending timer is
    /// cancelled, an in-flight status request is dropped and the download
    /// frame is cleared.
    pub fn hide_popup(&self) {
        let _render = self.inner.render.lock();
        self.inner.epoch.send_modify(|epoch| *epoch += 1);
        self.inner.view.hide_popup();
        self.cancel_timer();
        self.inner.frame.clear();
        self.set_state(PollState::Idle);
    }

    fn schedule_poll(&self, request: DownloadRequest) {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let epoch = *self.inner.epoch.borrow();
        let delay = self.inner.config.poll_interval;
        let request_id = request.request_id.clone();
        let poller = self.clone();

        let mut timer = self.inner.timer.lock();
        if let Some(previous) = timer.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if poller.disarm(ticket) {
                poller.poll_in_epoch(&request, epoch).await;
            }
        });

        tracing::trace!(request_id = %request_id, delay_ms = delay.as_millis() as u64, "Poll scheduled");
        *timer = Some(PendingPoll {
            ticket,
            request_id,
            handle,
        });
    }

    /// Clear the timer slot if it still holds `ticket`.
    fn disarm(&self, ticket: u64) -> bool {
        let mut timer = self.inner.timer.lock();
        if timer.as_ref().is_some_and(|pending| pending.ticket == ticket) {
            *timer = None;
            true
        } else {
            false
        }
    }

    fn cancel_timer(&self) {
        if let Some(pending) = self.inner.timer.lock().take() {
            tracing::debug!(request_id = %pending.request_id, "Cancelling scheduled poll");
            pending.handle.abort();
        }
    }

    fn set_state(&self, state: PollState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Poll state changed");
        }
    }
}
