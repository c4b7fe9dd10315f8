//! Download frame: where the archive URL gets loaded

use futures_util::StreamExt;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::time::Instant;
use url::Url;

use crate::download::{ArchiveDownload, ArchiveDownloadState};
use crate::error::DownloadError;
use crate::Result;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);
const FALLBACK_FILE_NAME: &str = "download";

/// Sink that loads the archive URL.
///
/// Loading is fire-and-forget: failures stay inside the frame and are never
/// reported back to the poller.
pub trait DownloadFrame: Send + Sync {
    /// Drop the frame content, stopping an unfinished load.
    fn clear(&self);

    /// Load `url` into the frame.
    fn load(&self, url: Url);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameControl {
    Continue,
    Cancel,
}

struct FrameJob {
    id: String,
    control: watch::Sender<FrameControl>,
}

struct FrameInner {
    http: reqwest::Client,
    download_dir: PathBuf,
    job: Mutex<Option<FrameJob>>,
    current: watch::Sender<Option<ArchiveDownload>>,
}

/// Frame that streams the archive into a download directory.
#[derive(Clone)]
pub struct ArchiveFrame {
    inner: Arc<FrameInner>,
}

impl ArchiveFrame {
    pub fn new(http: reqwest::Client, download_dir: PathBuf) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(FrameInner {
                http,
                download_dir,
                job: Mutex::new(None),
                current,
            }),
        }
    }

    /// Last archive loaded into the frame
    pub fn current(&self) -> Option<ArchiveDownload> {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ArchiveDownload>> {
        self.inner.current.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.job.lock().is_some()
    }

    fn cancel_job(&self) {
        if let Some(job) = self.inner.job.lock().take() {
            tracing::debug!(download_id = %job.id, "Cancelling archive download");
            let _ = job.control.send(FrameControl::Cancel);
        }
    }
}

impl DownloadFrame for ArchiveFrame {
    fn clear(&self) {
        self.cancel_job();
    }

    fn load(&self, url: Url) {
        self.cancel_job();

        let download = ArchiveDownload::new(url.to_string());
        let id = download.id.clone();
        self.inner.current.send_replace(Some(download));

        tracing::info!(download_id = %id, url = %url, "Loading archive");

        let (tx, rx) = watch::channel(FrameControl::Continue);
        let mut job = self.inner.job.lock();
        tokio::spawn(run_fetch(Arc::clone(&self.inner), id.clone(), url, rx));
        *job = Some(FrameJob { id, control: tx });
    }
}

impl FrameInner {
    fn update<F>(&self, id: &str, f: F)
    where
        F: FnOnce(&mut ArchiveDownload),
    {
        self.current.send_if_modified(|current| match current {
            Some(download) if download.id == id => {
                f(download);
                true
            }
            _ => false,
        });
    }

    fn finish_job(&self, id: &str) {
        let mut job = self.job.lock();
        if job.as_ref().is_some_and(|j| j.id == id) {
            *job = None;
        }
    }
}

async fn run_fetch(
    inner: Arc<FrameInner>,
    id: String,
    url: Url,
    mut control: watch::Receiver<FrameControl>,
) {
    let mut partial = None;
    let outcome = tokio::select! {
        _ = cancelled(&mut control) => Err(DownloadError::Cancelled),
        result = fetch_archive(&inner, &id, url, &mut partial) => result,
    };

    match outcome {
        Ok(path) => {
            let hash = match compute_sha256_hex(path).await {
                Ok(hash) => Some(hash),
                Err(e) => {
                    tracing::warn!(download_id = %id, error = %e, "Could not hash archive");
                    None
                }
            };
            inner.finish_job(&id);
            inner.update(&id, |d| d.complete(hash));
            tracing::info!(download_id = %id, "Archive saved");
        }
        Err(e) => {
            if let Some(path) = partial {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::debug!(download_id = %id, error = %e, "Partial archive not removed");
                }
            }
            inner.finish_job(&id);
            match e {
                DownloadError::Cancelled => {
                    inner.update(&id, |d| d.cancel());
                    tracing::info!(download_id = %id, "Archive download cancelled");
                }
                e => {
                    tracing::warn!(download_id = %id, error = %e, "Archive download failed");
                    inner.update(&id, |d| d.fail(e.to_string()));
                }
            }
        }
    }
}

async fn cancelled(control: &mut watch::Receiver<FrameControl>) {
    loop {
        if *control.borrow_and_update() == FrameControl::Cancel {
            return;
        }
        if control.changed().await.is_err() {
            // Job slot dropped without cancelling; let the fetch finish.
            std::future::pending::<()>().await;
        }
    }
}

/// Stream the archive into a `.part` file named after this job, then move it
/// into place. `partial` holds the part file while it exists.
async fn fetch_archive(
    inner: &FrameInner,
    id: &str,
    url: Url,
    partial: &mut Option<PathBuf>,
) -> Result<PathBuf> {
    let response = inner.http.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let total = response.content_length();
    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let file_name = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(file_name_from_disposition)
        .unwrap_or_else(|| fallback_file_name(&url));

    tokio::fs::create_dir_all(&inner.download_dir).await?;
    let path = inner.download_dir.join(&file_name);
    let part_path = inner.download_dir.join(format!("{file_name}.{id}.part"));

    inner.update(id, |d| {
        d.state = ArchiveDownloadState::Downloading;
        d.total_bytes = total;
        d.mime_type = mime_type;
        d.file_name = Some(file_name.clone());
        d.file_path = Some(path.to_string_lossy().to_string());
    });

    let mut file = tokio::fs::File::create(&part_path).await?;
    *partial = Some(part_path.clone());
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_publish = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded = downloaded.saturating_add(chunk.len() as u64);

        if last_publish.elapsed() >= PROGRESS_INTERVAL {
            last_publish = Instant::now();
            inner.update(id, |d| d.downloaded_bytes = downloaded);
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&part_path, &path).await?;
    *partial = None;
    inner.update(id, |d| d.downloaded_bytes = downloaded);

    Ok(path)
}

/// Extract a safe file name from a `Content-Disposition` header value.
///
/// Accepts both `attachment; filename="a.zip"` and the bare `filename=a.zip`.
fn file_name_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, name) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| name.trim().trim_matches('"'))
        })
        .and_then(sanitize_file_name)
}

fn fallback_file_name(url: &Url) -> String {
    let mut object_id = None;
    let mut version = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "objectId" => object_id = Some(value.into_owned()),
            "version" => version = Some(value.into_owned()),
            _ => {}
        }
    }

    let name = match (object_id, version) {
        (Some(id), Some(v)) if !v.is_empty() => format!("{id}-{v}"),
        (Some(id), _) => id,
        _ => url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .unwrap_or_default()
            .to_string(),
    };

    sanitize_file_name(&name).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

fn sanitize_file_name(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

async fn compute_sha256_hex(path: PathBuf) -> std::io::Result<String> {
    tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let mut hasher = Sha256::new();
        std::io::copy(&mut reader, &mut hasher)?;

        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(hex)
    })
    .await
    .unwrap_or_else(|e| Err(std::io::Error::other(e.to_string())))
}
