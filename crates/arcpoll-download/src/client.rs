//! Status endpoint client

use std::time::Duration;

use crate::error::DownloadError;
use crate::request::{DownloadRequest, Endpoint};
use crate::status::ArchiveStatus;
use crate::Result;

#[derive(Debug, Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl StatusClient {
    pub fn new(http: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }

    /// Build a client with its own HTTP connection pool.
    pub fn with_timeout(endpoint: Endpoint, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http, endpoint))
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Ask the server once whether the archive for `request` is ready.
    ///
    /// Transport failures and non-2xx responses are errors; a successful
    /// response is decoded into [`ArchiveStatus`].
    pub async fn check(&self, request: &DownloadRequest) -> Result<ArchiveStatus> {
        let url = self.endpoint.status_url(request);
        tracing::trace!(url = %url, "Checking archive status");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let body = response.text().await?;
        Ok(ArchiveStatus::from_body(&body))
    }
}
