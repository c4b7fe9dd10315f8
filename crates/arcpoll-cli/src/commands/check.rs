//! Single status query

use anyhow::Context;
use arcpoll_core::{Config, DownloadRequest, StatusClient};

use crate::cli::RequestArgs;

pub async fn run(config: &Config, args: RequestArgs) -> anyhow::Result<()> {
    let request = DownloadRequest::new(
        args.archive.object_id,
        args.archive.version,
        args.request_id,
    );
    let client = StatusClient::with_timeout(config.endpoint()?, config.request_timeout())?;

    let status = client
        .check(&request)
        .await
        .with_context(|| format!("status request {} failed", request.request_id))?;

    println!("{status}");
    Ok(())
}
