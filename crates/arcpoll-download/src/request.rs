//! Archive identifiers and download endpoint URLs

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DownloadError;
use crate::Result;

const DOWNLOAD_PATH: &str = "download";
const P_OBJECT_ID: &str = "objectId";
const P_VERSION: &str = "version";
const P_REQUEST_ID: &str = "requestId";

/// Identifies an archive on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveId {
    pub object_id: String,
    pub version: String,
}

impl ArchiveId {
    pub fn new(object_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.object_id, self.version)
    }
}

/// One archive preparation job. Immutable for the lifetime of a polling sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub archive: ArchiveId,
    pub request_id: String,
}

impl DownloadRequest {
    pub fn new(
        object_id: impl Into<String>,
        version: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            archive: ArchiveId::new(object_id, version),
            request_id: request_id.into(),
        }
    }
}

/// The server's download endpoint, rooted at the configured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    context: Url,
}

impl Endpoint {
    /// Parse an absolute http(s) context URL.
    ///
    /// The context is always treated as a directory, so `http://host/zmd`
    /// and `http://host/zmd/` both resolve to `http://host/zmd/download`.
    pub fn parse(context: &str) -> Result<Self> {
        let mut url =
            Url::parse(context.trim()).map_err(|e| DownloadError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                context
            )));
        }

        url.set_query(None);
        url.set_fragment(None);
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { context: url })
    }

    /// `{context}/download?objectId={id}&version={v}`
    pub fn archive_url(&self, archive: &ArchiveId) -> Url {
        let mut url = self.download_url();
        url.query_pairs_mut()
            .append_pair(P_OBJECT_ID, &archive.object_id)
            .append_pair(P_VERSION, &archive.version);
        url
    }

    /// `{context}/download?objectId={id}&version={v}&requestId={r}`
    pub fn status_url(&self, request: &DownloadRequest) -> Url {
        let mut url = self.archive_url(&request.archive);
        url.query_pairs_mut()
            .append_pair(P_REQUEST_ID, &request.request_id);
        url
    }

    fn download_url(&self) -> Url {
        let mut url = self.context.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(DOWNLOAD_PATH);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_url() {
        let endpoint = Endpoint::parse("http://localhost:8080/zmd").unwrap();
        let url = endpoint.archive_url(&ArchiveId::new("A1", "2"));

        assert_eq!(
            url.as_str(),
            "http://localhost:8080/zmd/download?objectId=A1&version=2"
        );
    }

    #[test]
    fn test_status_url() {
        let endpoint = Endpoint::parse("http://localhost:8080/zmd/").unwrap();
        let url = endpoint.status_url(&DownloadRequest::new("A1", "2", "R9"));

        assert_eq!(
            url.as_str(),
            "http://localhost:8080/zmd/download?objectId=A1&version=2&requestId=R9"
        );
    }

    #[test]
    fn test_root_context() {
        let endpoint = Endpoint::parse("https://archive.example.org").unwrap();
        let url = endpoint.archive_url(&ArchiveId::new("A1", "2"));

        assert_eq!(
            url.as_str(),
            "https://archive.example.org/download?objectId=A1&version=2"
        );
    }

    #[test]
    fn test_query_values_are_encoded() {
        let endpoint = Endpoint::parse("http://localhost/zmd").unwrap();
        let url = endpoint.status_url(&DownloadRequest::new("a b&c", "1", "x=y"));

        assert_eq!(
            url.query(),
            Some("objectId=a+b%26c&version=1&requestId=x%3Dy")
        );
    }

    #[test]
    fn test_invalid_context() {
        assert!(matches!(
            Endpoint::parse("/zmd"),
            Err(DownloadError::InvalidUrl(_))
        ));
        assert!(matches!(
            Endpoint::parse("ftp://example.org/zmd"),
            Err(DownloadError::InvalidUrl(_))
        ));
    }
}
