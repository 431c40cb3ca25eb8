// Downloader behaviour against a mocked HTTP server

use camels_convert::{DataSource, Downloader, FetchError, ProgressSink};
use mockito::Server;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingProgress {
    started: AtomicU64,
    bytes: AtomicU64,
    finished: AtomicU64,
}

impl ProgressSink for RecordingProgress {
    fn download_started(&self, _file_name: &str, _total_bytes: u64) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn download_advanced(&self, _file_name: &str, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }

    fn download_finished(&self, _file_name: &str) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

fn source(server: &Server, name: &str) -> DataSource {
    DataSource::parse(&format!("{}/files/{}", server.url(), name)).unwrap()
}

#[tokio::test]
async fn test_downloads_missing_file_in_chunks() {
    let mut server = Server::new_async().await;
    let body = vec![7u8; 10_000];
    let get = server
        .mock("GET", "/files/camels_attributes_v2.0.zip")
        .with_status(200)
        .with_body(&body)
        .expect(1)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("data");
    let progress = Arc::new(RecordingProgress::default());
    let downloader = Downloader::new(&dest).with_chunk_size(1024);

    let report = downloader
        .fetch_all(
            &[source(&server, "camels_attributes_v2.0.zip")],
            progress.clone(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.downloaded, vec!["camels_attributes_v2.0.zip".to_string()]);
    assert!(report.skipped.is_empty());
    assert_eq!(std::fs::read(dest.join("camels_attributes_v2.0.zip")).unwrap(), body);
    assert_eq!(progress.started.load(Ordering::SeqCst), 1);
    assert_eq!(progress.bytes.load(Ordering::SeqCst), 10_000);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    get.assert_async().await;
}

#[tokio::test]
async fn test_cached_file_with_matching_size_is_skipped() {
    let mut server = Server::new_async().await;
    let head = server
        .mock("HEAD", "/files/basin_set_full_res.zip")
        .with_status(200)
        .with_header("content-length", "5")
        .with_body("hello")
        .expect(1)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/files/basin_set_full_res.zip")
        .expect(0)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("basin_set_full_res.zip"), "world").unwrap();

    let report = Downloader::new(temp.path())
        .fetch_all(
            &[source(&server, "basin_set_full_res.zip")],
            Arc::new(RecordingProgress::default()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.skipped, vec!["basin_set_full_res.zip".to_string()]);
    assert!(report.downloaded.is_empty());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("basin_set_full_res.zip")).unwrap(),
        "world"
    );
    head.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_cached_file_with_wrong_size_is_fetched_again() {
    let mut server = Server::new_async().await;
    let head = server
        .mock("HEAD", "/files/basin_set_full_res.zip")
        .with_status(200)
        .with_header("content-length", "10")
        .with_body("fresh data")
        .expect(1)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/files/basin_set_full_res.zip")
        .with_status(200)
        .with_body("fresh data")
        .expect(1)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("basin_set_full_res.zip"), "stale").unwrap();

    let report = Downloader::new(temp.path())
        .fetch_all(
            &[source(&server, "basin_set_full_res.zip")],
            Arc::new(RecordingProgress::default()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.downloaded, vec!["basin_set_full_res.zip".to_string()]);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("basin_set_full_res.zip")).unwrap(),
        "fresh data"
    );
    head.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn test_http_error_is_fatal() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/files/missing.zip")
        .with_status(404)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let result = Downloader::new(temp.path())
        .fetch_all(
            &[source(&server, "missing.zip")],
            Arc::new(RecordingProgress::default()),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(FetchError::HttpStatus { status, url, .. }) => {
            assert_eq!(status.as_u16(), 404);
            assert!(url.ends_with("/files/missing.zip"));
        }
        other => panic!("Expected HttpStatus error, got {other:?}"),
    }
    get.assert_async().await;
}

#[tokio::test]
async fn test_cancelled_token_stops_queued_downloads() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/files/camels_attributes_v2.0.zip")
        .expect(0)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Downloader::new(temp.path())
        .fetch_all(
            &[source(&server, "camels_attributes_v2.0.zip")],
            Arc::new(RecordingProgress::default()),
            &cancel,
        )
        .await
        .unwrap();

    assert!(report.was_cancelled());
    assert_eq!(report.cancelled, vec!["camels_attributes_v2.0.zip".to_string()]);
    get.assert_async().await;
}

/// Cancels the run as soon as the first chunk lands on disk.
struct CancelOnFirstChunk {
    cancel: CancellationToken,
    cancelled: Mutex<Vec<String>>,
}

impl ProgressSink for CancelOnFirstChunk {
    fn download_started(&self, _file_name: &str, _total_bytes: u64) {}

    fn download_advanced(&self, _file_name: &str, _bytes: u64) {
        self.cancel.cancel();
    }

    fn download_finished(&self, file_name: &str) {
        panic!("{file_name} should not finish");
    }

    fn download_cancelled(&self, file_name: &str) {
        self.cancelled.lock().unwrap().push(file_name.to_string());
    }
}

#[tokio::test]
async fn test_cancelling_mid_stream_keeps_partial_file() {
    let mut server = Server::new_async().await;
    let body = vec![3u8; 64 * 1024];
    let get = server
        .mock("GET", "/files/basin_set_full_res.zip")
        .with_status(200)
        .with_body(&body)
        .expect(1)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let progress = Arc::new(CancelOnFirstChunk {
        cancel: cancel.clone(),
        cancelled: Mutex::new(Vec::new()),
    });

    let report = Downloader::new(temp.path())
        .with_chunk_size(1024)
        .fetch_all(&[source(&server, "basin_set_full_res.zip")], progress.clone(), &cancel)
        .await
        .unwrap();

    assert_eq!(report.cancelled, vec!["basin_set_full_res.zip".to_string()]);
    assert!(report.downloaded.is_empty());
    let partial = std::fs::metadata(temp.path().join("basin_set_full_res.zip")).unwrap().len();
    assert!(partial > 0 && partial < body.len() as u64, "partial file has {partial} bytes");
    assert_eq!(*progress.cancelled.lock().unwrap(), vec!["basin_set_full_res.zip".to_string()]);
    get.assert_async().await;
}

#[tokio::test]
async fn test_failed_download_stops_the_queue() {
    let mut server = Server::new_async().await;
    let missing = server
        .mock("GET", "/files/missing.zip")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let queued = server
        .mock("GET", "/files/camels_attributes_v2.0.zip")
        .expect(0)
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let result = Downloader::new(temp.path())
        .with_workers(1)
        .fetch_all(
            &[
                source(&server, "missing.zip"),
                source(&server, "camels_attributes_v2.0.zip"),
            ],
            Arc::new(RecordingProgress::default()),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(FetchError::HttpStatus { .. })));
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(!temp.path().join("camels_attributes_v2.0.zip").exists());
    missing.assert_async().await;
    queued.assert_async().await;
}
