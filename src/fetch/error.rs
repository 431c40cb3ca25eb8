use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid source URL '{0}'")]
    InvalidUrl(String, #[source] url::ParseError),

    #[error("Source URL '{0}' has no file name segment")]
    MissingFileName(String),

    #[error("Failed to create download directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read metadata for cached file '{0}'")]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete stale cached file '{0}'")]
    CacheDeletion(PathBuf, #[source] std::io::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response for {0} carries no usable Content-Length header")]
    MissingContentLength(String),

    #[error("I/O error writing download to '{0}'")]
    DownloadIo(PathBuf, #[source] std::io::Error),

    #[error("Download task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
