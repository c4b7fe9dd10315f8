//! Command-line arguments

use std::path::PathBuf;

use anyhow::Context;
use arcpoll_core::Config;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "arcpoll", version, about = "Wait for a server-prepared archive and download it")]
pub struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the download endpoint
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Directory downloaded archives are saved to
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// Delay between status requests while the archive is being prepared
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll until the archive is ready, then download it
    Wait(WaitArgs),
    /// Ask once whether the archive is ready
    Check(RequestArgs),
    /// Download an archive that is already prepared
    Download(ArchiveArgs),
}

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    #[arg(long)]
    pub object_id: String,

    #[arg(long = "version", id = "archive_version", value_name = "VERSION")]
    pub version: String,
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Identifier of the archive preparation request
    #[arg(long)]
    pub request_id: String,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Stop once the archive is ready instead of downloading it
    #[arg(long)]
    pub no_download: bool,
}

impl Cli {
    /// Config file (or defaults), then `ARCPOLL_*` variables, then flags.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => Config::default(),
        };
        config.apply_env()?;

        if let Some(context) = &self.context {
            config.context = context.clone();
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_wait() {
        let cli = Cli::try_parse_from([
            "arcpoll",
            "wait",
            "--object-id",
            "A1",
            "--version",
            "2",
            "--request-id",
            "R9",
            "--no-download",
        ])
        .unwrap();

        match cli.command {
            Command::Wait(args) => {
                assert_eq!(args.request.archive.object_id, "A1");
                assert_eq!(args.request.archive.version, "2");
                assert_eq!(args.request.request_id, "R9");
                assert!(args.no_download);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_request_id() {
        let result =
            Cli::try_parse_from(["arcpoll", "check", "--object-id", "A1", "--version", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "context": "http://file.example.org/zmd", "poll_interval_ms": 1000 }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from([
            "arcpoll",
            "--config",
            path.as_str(),
            "--context",
            "http://flag.example.org/zmd",
            "download",
            "--object-id",
            "A1",
            "--version",
            "2",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.context, "http://flag.example.org/zmd");
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let cli = Cli::try_parse_from([
            "arcpoll",
            "--context",
            "http://localhost/zmd",
            "--poll-interval-ms",
            "0",
            "download",
            "--object-id",
            "A1",
            "--version",
            "2",
        ])
        .unwrap();

        assert!(cli.resolve_config().is_err());
    }
}
