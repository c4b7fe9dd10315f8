//! Direct archive download

use arcpoll_core::{ArchiveId, DownloadSession};

use crate::cli::ArchiveArgs;

pub async fn run(session: &DownloadSession, args: ArchiveArgs) -> anyhow::Result<()> {
    let archive = ArchiveId::new(args.object_id, args.version);

    session.poller().show_popup();
    session.poller().download_archive(&archive);

    super::await_archive(session).await
}
