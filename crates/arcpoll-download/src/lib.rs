//! Archive download poller
//!
//! Asks the server whether a prepared archive is ready, renders the
//! wait / ready / error states through a [`DownloadView`], and loads the
//! archive through a [`DownloadFrame`] once the user follows the ready link.

mod client;
mod download;
mod error;
mod frame;
mod poller;
mod request;
mod status;
mod view;

pub use client::StatusClient;
pub use download::{ArchiveDownload, ArchiveDownloadState};
pub use error::DownloadError;
pub use frame::{ArchiveFrame, DownloadFrame};
pub use poller::{DownloadPoller, Messages, PollOutcome, PollerConfig, DEFAULT_POLL_INTERVAL};
pub use request::{ArchiveId, DownloadRequest, Endpoint};
pub use status::{ArchiveStatus, PollState};
pub use view::{DownloadView, InfoRegion, ReadyLink};

pub type Result<T> = std::result::Result<T, DownloadError>;
