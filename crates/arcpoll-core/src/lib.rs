//! Archive poller core
//!
//! Loads configuration, initialises logging and wires the poller, its status
//! client and the archive frame into a [`DownloadSession`].

mod config;
mod error;
mod session;

pub use config::Config;
pub use error::CoreError;
pub use session::DownloadSession;

// Re-export download components
pub use arcpoll_download::{
    ArchiveDownload, ArchiveDownloadState, ArchiveFrame, ArchiveId, ArchiveStatus, DownloadError,
    DownloadFrame, DownloadPoller, DownloadRequest, DownloadView, Endpoint, InfoRegion, Messages,
    PollOutcome, PollState, PollerConfig, ReadyLink, StatusClient,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
