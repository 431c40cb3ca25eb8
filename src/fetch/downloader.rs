use crate::fetch::error::FetchError;
use crate::progress::ProgressSink;
use crate::types::source::DataSource;
use crate::utils::ensure_dir_exists;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, Response};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_DOWNLOAD_WORKERS};

/// What happened to each source during a [`Downloader::fetch_all`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Cached files whose size matched the remote `Content-Length`.
    pub skipped: Vec<String>,
    /// Files streamed completely to disk.
    pub downloaded: Vec<String>,
    /// Files abandoned because the run was cancelled; partial data stays on disk.
    pub cancelled: Vec<String>,
}

impl FetchReport {
    pub fn was_cancelled(&self) -> bool {
        !self.cancelled.is_empty()
    }
}

enum DownloadOutcome {
    Completed(String),
    Cancelled(String),
}

/// Mirrors a set of remote files into a local directory.
///
/// Files already present are validated against the remote `Content-Length`
/// and only re-downloaded when the sizes differ. Downloads run on a bounded
/// number of tokio tasks and stream to disk chunk by chunk.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    dest_dir: PathBuf,
    workers: usize,
    chunk_size: usize,
}

impl Downloader {
    pub fn new(dest_dir: &Path) -> Self {
        Self {
            client: Client::new(),
            dest_dir: dest_dir.to_path_buf(),
            workers: DEFAULT_DOWNLOAD_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Ensures every source exists in the destination directory.
    ///
    /// Stale cache entries are deleted and fetched again. The first network
    /// failure aborts the call along with every other download; there are no
    /// retries. When `cancel` fires, in-flight downloads stop at the next
    /// chunk boundary and are listed in [`FetchReport::cancelled`].
    pub async fn fetch_all(
        &self,
        sources: &[DataSource],
        progress: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, FetchError> {
        ensure_dir_exists(&self.dest_dir)
            .await
            .map_err(|e| FetchError::DirCreation(self.dest_dir.clone(), e))?;

        let mut report = FetchReport::default();
        let mut queue = Vec::new();
        for source in sources {
            let path = self.dest_dir.join(source.file_name());
            if self.is_cached(source, &path).await? {
                info!("Cache hit for {} at {:?}", source.file_name(), path);
                report.skipped.push(source.file_name().to_string());
            } else {
                queue.push(source.clone());
            }
        }

        let mut jobs = queue.into_iter().map(|source| DownloadJob {
            client: self.client.clone(),
            path: self.dest_dir.join(source.file_name()),
            chunk_size: self.chunk_size,
            progress: Arc::clone(&progress),
            cancel: cancel.clone(),
            source,
        });
        // dropping the set on an early return aborts the downloads still running
        let mut running = JoinSet::new();
        for job in jobs.by_ref().take(self.workers) {
            running.spawn(job.run());
        }
        while let Some(joined) = running.join_next().await {
            match joined?? {
                DownloadOutcome::Completed(name) => report.downloaded.push(name),
                DownloadOutcome::Cancelled(name) => report.cancelled.push(name),
            }
            if let Some(job) = jobs.next() {
                running.spawn(job.run());
            }
        }
        Ok(report)
    }

    /// A cached file is valid when its size equals the remote `Content-Length`.
    /// Invalid copies are deleted so the caller re-queues them.
    async fn is_cached(&self, source: &DataSource, path: &Path) -> Result<bool, FetchError> {
        let local_len = match fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(FetchError::CacheMetadataRead(path.to_path_buf(), e)),
        };

        let remote_len = self.remote_content_length(source).await?;
        if remote_len == local_len {
            return Ok(true);
        }
        info!(
            "Cached {} has {} bytes but remote has {}, fetching again",
            source.file_name(),
            local_len,
            remote_len
        );
        fs::remove_file(path)
            .await
            .map_err(|e| FetchError::CacheDeletion(path.to_path_buf(), e))?;
        Ok(false)
    }

    async fn remote_content_length(&self, source: &DataSource) -> Result<u64, FetchError> {
        let url = source.url().to_string();
        let response = self
            .client
            .head(source.url().clone())
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;
        let response = check_status(response, &url)?;
        content_length(&response).ok_or(FetchError::MissingContentLength(url))
    }
}

struct DownloadJob {
    client: Client,
    source: DataSource,
    path: PathBuf,
    chunk_size: usize,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl DownloadJob {
    async fn run(self) -> Result<DownloadOutcome, FetchError> {
        let name = self.source.file_name().to_string();
        if self.cancel.is_cancelled() {
            return Ok(DownloadOutcome::Cancelled(name));
        }

        let url = self.source.url().to_string();
        info!("Downloading {} to {:?}", url, self.path);
        let response = self
            .client
            .get(self.source.url().clone())
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;
        let response = check_status(response, &url)?;
        let total = content_length(&response).ok_or(FetchError::MissingContentLength(url))?;
        self.progress.download_started(&name, total);

        let io_err = |e| FetchError::DownloadIo(self.path.clone(), e);
        let mut file = fs::File::create(&self.path).await.map_err(io_err)?;
        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = StreamReader::new(stream);
        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            let read = reader.read(&mut buffer).await.map_err(io_err)?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read]).await.map_err(io_err)?;
            self.progress.download_advanced(&name, read as u64);
            if self.cancel.is_cancelled() {
                file.flush().await.map_err(io_err)?;
                warn!("Download of {} cancelled, partial file left at {:?}", name, self.path);
                self.progress.download_cancelled(&name);
                return Ok(DownloadOutcome::Cancelled(name));
            }
        }
        file.flush().await.map_err(io_err)?;

        self.progress.download_finished(&name);
        info!("Downloaded {:?}", self.path);
        Ok(DownloadOutcome::Completed(name))
    }
}

fn check_status(response: Response, url: &str) -> Result<Response, FetchError> {
    match response.error_for_status() {
        Ok(resp) => Ok(resp),
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e);
            Err(if let Some(status) = e.status() {
                FetchError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                }
            } else {
                FetchError::NetworkRequest(url.to_string(), e)
            })
        }
    }
}

/// Reads `Content-Length` from the headers. `Response::content_length` reports
/// the body size hint, which is zero for `HEAD` responses.
fn content_length(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}
