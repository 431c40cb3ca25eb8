use log::info;
use std::io;
use std::path::Path;
use std::time::Instant;

use crate::progress::ProgressSink;

/// Creates `path` (and its parents) unless it already exists as a directory.
pub async fn ensure_dir_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("Path exists but is not a directory: {}", path.display()),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating directory: {}", path.display());
            tokio::fs::create_dir_all(path).await
        }
        Err(e) => Err(e),
    }
}

/// Runs one pipeline stage, reporting its start and elapsed time.
pub async fn timed_stage<T, E, F>(
    progress: &dyn ProgressSink,
    description: &str,
    stage: F,
) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    progress.stage_started(description);
    let start = Instant::now();
    let value = stage.await?;
    let elapsed = start.elapsed();
    progress.stage_finished(description, elapsed);
    info!("{description} finished in {elapsed:.2?}");
    Ok(value)
}
