//! Polling sequence

use anyhow::bail;
use arcpoll_core::{DownloadRequest, DownloadSession, PollOutcome, PollState, ReadyLink};
use tokio::sync::mpsc;

use crate::cli::WaitArgs;

pub async fn run(
    session: &DownloadSession,
    links: &mut mpsc::UnboundedReceiver<ReadyLink>,
    args: WaitArgs,
) -> anyhow::Result<()> {
    let request = DownloadRequest::new(
        args.request.archive.object_id,
        args.request.archive.version,
        args.request.request_id,
    );
    let poller = session.poller();

    tracing::info!(
        object_id = %request.archive.object_id,
        request_id = %request.request_id,
        "Waiting for archive"
    );

    let state = tokio::select! {
        state = run_sequence(session, &request) => state,
        _ = tokio::signal::ctrl_c() => {
            poller.hide_popup();
            bail!("interrupted while waiting for the archive");
        }
    };

    match state {
        PollState::Ready => {}
        PollState::Error => bail!("archive request {} failed", request.request_id),
        state => bail!("polling stopped in state {state}"),
    }

    if args.no_download {
        return Ok(());
    }

    // The view forwards the rendered link; following it stands in for a click.
    let Some(link) = links.recv().await else {
        bail!("ready link was never rendered");
    };
    link.activate(poller);

    super::await_archive(session).await
}

/// Poll right away, then follow the rescheduled polls until the sequence ends.
async fn run_sequence(session: &DownloadSession, request: &DownloadRequest) -> PollState {
    let poller = session.poller();
    let mut states = poller.subscribe();

    match poller.poll(request).await {
        PollOutcome::Ready => return PollState::Ready,
        PollOutcome::Failed => return PollState::Error,
        PollOutcome::Abandoned => return PollState::Idle,
        PollOutcome::Pending => {}
    }

    let ended = states
        .wait_for(|state| state.is_terminal() || *state == PollState::Idle)
        .await
        .map(|state| *state);
    ended.unwrap_or(PollState::Idle)
}
