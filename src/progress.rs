//! Progress reporting for downloads and pipeline stages.
//!
//! The fetcher and the converter never print on their own; they report to a
//! [`ProgressSink`] handed in by the caller. Sinks are shared by concurrent
//! download workers, so every method takes `&self`.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const DOWNLOAD_TEMPLATE: &str =
    "{msg:>45.bold.blue} {wide_bar} {percent:>3}% • {bytes}/{total_bytes} • {binary_bytes_per_sec} • {eta}";
const STAGE_TEMPLATE: &str = "{spinner:.green} {msg}";

pub trait ProgressSink: Send + Sync {
    /// A download of `total_bytes` bytes is about to stream to disk.
    fn download_started(&self, file_name: &str, total_bytes: u64);
    /// `bytes` more bytes of `file_name` were written.
    fn download_advanced(&self, file_name: &str, bytes: u64);
    fn download_finished(&self, file_name: &str);
    /// The download stopped early because the run was cancelled.
    fn download_cancelled(&self, _file_name: &str) {}
    fn stage_started(&self, _description: &str) {}
    fn stage_finished(&self, _description: &str, _elapsed: Duration) {}
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn download_started(&self, _file_name: &str, _total_bytes: u64) {}
    fn download_advanced(&self, _file_name: &str, _bytes: u64) {}
    fn download_finished(&self, _file_name: &str) {}
}

/// Terminal progress: one bar per download, one spinner per pipeline stage.
pub struct ConsoleProgress {
    multi: MultiProgress,
    downloads: Mutex<HashMap<String, ProgressBar>>,
    stage: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    /// Draws somewhere other than stderr, e.g. [`ProgressDrawTarget::hidden`].
    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            downloads: Mutex::new(HashMap::new()),
            stage: Mutex::new(None),
        }
    }

    fn with_download(&self, file_name: &str, f: impl FnOnce(&ProgressBar)) {
        let downloads = self.downloads.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = downloads.get(file_name) {
            f(bar);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn download_started(&self, file_name: &str, total_bytes: u64) {
        let style = ProgressStyle::with_template(DOWNLOAD_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = self.multi.add(ProgressBar::new(total_bytes));
        bar.set_style(style);
        bar.set_message(file_name.to_string());
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file_name.to_string(), bar);
    }

    fn download_advanced(&self, file_name: &str, bytes: u64) {
        self.with_download(file_name, |bar| bar.inc(bytes));
    }

    fn download_finished(&self, file_name: &str) {
        self.with_download(file_name, |bar| bar.finish());
        if let Err(e) = self.multi.println(format!("Downloaded {file_name}")) {
            debug!("Could not print download summary for {file_name}: {e}");
        }
    }

    fn download_cancelled(&self, file_name: &str) {
        self.with_download(file_name, |bar| bar.abandon_with_message(format!("{file_name} (cancelled)")));
    }

    fn stage_started(&self, description: &str) {
        let style = ProgressStyle::with_template(STAGE_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(style);
        spinner.set_message(format!("{description} ..."));
        spinner.enable_steady_tick(Duration::from_millis(120));
        *self.stage.lock().unwrap_or_else(PoisonError::into_inner) = Some(spinner);
    }

    fn stage_finished(&self, description: &str, elapsed: Duration) {
        if let Some(spinner) = self.stage.lock().unwrap_or_else(PoisonError::into_inner).take() {
            spinner.finish_with_message(format!("{description} [✔] ({elapsed:.2?})"));
        }
    }
}
