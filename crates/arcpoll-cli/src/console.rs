//! Terminal rendering of the download popup

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use arcpoll_core::{DownloadView, InfoRegion, ReadyLink};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Prints the info region to stdout and hands rendered ready links to the
/// command driving the poller, which activates them in place of a click.
pub struct ConsoleView {
    visible: AtomicBool,
    last_message: Mutex<Option<String>>,
    links: mpsc::UnboundedSender<ReadyLink>,
}

impl ConsoleView {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReadyLink>) {
        let (links, rx) = mpsc::unbounded_channel();
        let view = Self {
            visible: AtomicBool::new(false),
            last_message: Mutex::new(None),
            links,
        };
        (view, rx)
    }

    fn print(&self, line: String) {
        let mut last = self.last_message.lock();
        if last.as_deref() == Some(line.as_str()) {
            return;
        }

        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
        *last = Some(line);
    }
}

impl DownloadView for ConsoleView {
    fn render_info(&self, info: InfoRegion) {
        match info {
            InfoRegion::Empty => {
                *self.last_message.lock() = None;
            }
            InfoRegion::Message { text } => self.print(text),
            InfoRegion::Link(link) => {
                self.print(format!("{} [{}]", link.label, link.archive));
                let _ = self.links.send(link);
            }
        }
    }

    fn show_popup(&self) {
        if !self.visible.swap(true, Ordering::SeqCst) {
            tracing::debug!("Download popup shown");
        }
    }

    fn hide_popup(&self) {
        if self.visible.swap(false, Ordering::SeqCst) {
            tracing::debug!("Download popup hidden");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcpoll_core::ArchiveId;

    #[test]
    fn test_link_is_forwarded() {
        let (view, mut links) = ConsoleView::new();
        let link = ReadyLink {
            label: "Download".to_string(),
            archive: ArchiveId::new("A1", "2"),
        };

        view.render_info(InfoRegion::Link(link.clone()));

        assert_eq!(links.try_recv().unwrap(), link);
        assert!(links.try_recv().is_err());
    }

    #[test]
    fn test_repeated_message_printed_once() {
        let (view, _links) = ConsoleView::new();

        view.render_info(InfoRegion::Message {
            text: "wait".to_string(),
        });
        view.render_info(InfoRegion::Message {
            text: "wait".to_string(),
        });

        assert_eq!(view.last_message.lock().as_deref(), Some("wait"));
    }

    #[test]
    fn test_visibility() {
        let (view, _links) = ConsoleView::new();
        assert!(!view.visible.load(Ordering::SeqCst));

        view.show_popup();
        assert!(view.visible.load(Ordering::SeqCst));

        view.hide_popup();
        assert!(!view.visible.load(Ordering::SeqCst));
    }
}
