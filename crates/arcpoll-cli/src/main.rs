//! `arcpoll`: terminal host for the archive download poller

mod cli;
mod commands;
mod console;

use std::process::ExitCode;
use std::sync::Arc;

use arcpoll_core::{Config, DownloadSession, ReadyLink};
use clap::Parser;
use tokio::sync::mpsc;

use cli::{Cli, Command};
use console::ConsoleView;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    arcpoll_core::init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Check(args) => commands::check::run(&config, args).await,
        Command::Wait(args) => {
            let (session, mut links) = open_session(config)?;
            commands::wait::run(&session, &mut links, args).await
        }
        Command::Download(args) => {
            let (session, _links) = open_session(config)?;
            commands::download::run(&session, args).await
        }
    }
}

fn open_session(
    config: Config,
) -> anyhow::Result<(DownloadSession, mpsc::UnboundedReceiver<ReadyLink>)> {
    let (view, links) = ConsoleView::new();
    let session = DownloadSession::new(config, Arc::new(view))?;
    Ok((session, links))
}
