//! Popup and info region seam

use crate::poller::DownloadPoller;
use crate::request::ArchiveId;

/// Content of the popup's info region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoRegion {
    Empty,
    Message { text: String },
    Link(ReadyLink),
}

/// Link rendered once the archive is ready. Activating it downloads the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyLink {
    pub label: String,
    pub archive: ArchiveId,
}

impl ReadyLink {
    pub fn activate(&self, poller: &DownloadPoller) {
        poller.download_archive(&self.archive);
    }
}

/// Host UI for the download popup.
///
/// The poller renders into the info region and toggles popup visibility;
/// everything else about presentation belongs to the implementation.
pub trait DownloadView: Send + Sync {
    fn render_info(&self, info: InfoRegion);

    fn show_popup(&self);

    fn hide_popup(&self);
}
