//! Command implementations
//!
//! Each command drives the poller the way a user would drive the popup:
//! waiting, following the ready link, or closing the popup on Ctrl-C.

pub mod check;
pub mod download;
pub mod wait;

use anyhow::bail;
use arcpoll_core::{ArchiveDownloadState, DownloadSession};

/// Wait for the archive frame to finish and report where the archive went.
/// Ctrl-C hides the popup, which cancels the download.
pub(crate) async fn await_archive(session: &DownloadSession) -> anyhow::Result<()> {
    let download = tokio::select! {
        download = session.wait_for_archive() => download,
        _ = tokio::signal::ctrl_c() => {
            session.poller().hide_popup();
            bail!("interrupted, archive download cancelled");
        }
    };

    let Some(download) = download else {
        bail!("no archive was loaded");
    };

    match download.state {
        ArchiveDownloadState::Completed => {
            let path = download.file_path.unwrap_or_default();
            match download.hash {
                Some(hash) => println!("Saved {path} (sha256 {hash})"),
                None => println!("Saved {path}"),
            }
            Ok(())
        }
        ArchiveDownloadState::Failed => bail!(
            "archive download failed at {:.0}%: {}",
            download.progress(),
            download.error.unwrap_or_else(|| "unknown error".to_string())
        ),
        state => bail!(
            "archive download ended as {state} at {:.0}%",
            download.progress()
        ),
    }
}
