//! Poller configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use arcpoll_download::{Endpoint, Messages, PollerConfig, DEFAULT_POLL_INTERVAL};

use crate::error::CoreError;
use crate::Result;

const DEFAULT_CONTEXT: &str = "http://localhost:8080/zmd";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const ENV_CONTEXT: &str = "ARCPOLL_CONTEXT";
const ENV_DOWNLOAD_DIR: &str = "ARCPOLL_DOWNLOAD_DIR";
const ENV_POLL_INTERVAL_MS: &str = "ARCPOLL_POLL_INTERVAL_MS";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL the download endpoint lives under
    pub context: String,
    /// Texts for the wait / ready / error popup states
    pub messages: Messages,
    /// Delay between status requests while the archive is being prepared
    pub poll_interval_ms: u64,
    /// Timeout for a single status request
    pub request_timeout_secs: u64,
    /// Where the archive frame saves downloaded archives
    pub download_dir: PathBuf,
}

impl Config {
    pub fn new(context: impl Into<String>) -> Self {
        let download_dir =
            dirs::download_dir().unwrap_or_else(|| Self::data_dir().join("Downloads"));

        Self {
            context: context.into(),
            messages: Messages::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_dir,
        }
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), context = %config.context, "Loaded config");
        Ok(config)
    }

    /// Override fields from `ARCPOLL_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(context) = var(ENV_CONTEXT) {
            self.context = context;
        }
        if let Some(dir) = var(ENV_DOWNLOAD_DIR) {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(interval) = var(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = interval.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_POLL_INTERVAL_MS} is not a number: {interval}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        Endpoint::parse(&self.context)
            .map_err(|e| CoreError::Config(format!("invalid context '{}': {e}", self.context)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            messages: self.messages.clone(),
            poll_interval: self.poll_interval(),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("arcpoll"))
            .unwrap_or_else(|| PathBuf::from(".arcpoll"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT)
    }
}

// Platform directories, resolved from the environment
mod dirs {
    use std::path::PathBuf;

    fn home() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        let var = "USERPROFILE";
        #[cfg(not(target_os = "windows"))]
        let var = "HOME";

        std::env::var(var).ok().map(PathBuf::from)
    }

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            home().map(|h| h.join("Library/Application Support"))
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| home().map(|h| h.join(".local/share")))
        }
    }

    pub fn download_dir() -> Option<PathBuf> {
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            if let Ok(dir) = std::env::var("XDG_DOWNLOAD_DIR") {
                return Some(PathBuf::from(dir));
            }
        }

        home().map(|h| h.join("Downloads"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.context, DEFAULT_CONTEXT);
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
        assert_eq!(config.messages, Messages::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "context": "https://repo.example.org/zmd",
                "messages": {{ "wait": "Proszę czekać" }},
                "poll_interval_ms": 2500
            }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.context, "https://repo.example.org/zmd");
        assert_eq!(config.messages.wait, "Proszę czekać");
        assert_eq!(config.messages.error, Messages::default().error);
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_rejects_relative_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "context": "/zmd" }}"#).unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "context = 'toml'").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_CONTEXT, "http://archive.local/zmd"),
            (ENV_DOWNLOAD_DIR, "/tmp/archives"),
            (ENV_POLL_INTERVAL_MS, "750"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.context, "http://archive.local/zmd");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/archives"));
        assert_eq!(config.poll_interval_ms, 750);
    }

    #[test]
    fn test_env_bad_interval() {
        let mut config = Config::default();
        let result = config.apply_vars(|key| {
            (key == ENV_POLL_INTERVAL_MS).then(|| "soon".to_string())
        });

        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let mut config = Config::default();
        config.poll_interval_ms = 0;

        assert!(config.validate().is_err());
    }
}
