//! Downloading the CAMELS archives into the local data directory.

pub mod downloader;
pub mod error;
