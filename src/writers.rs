//! Serializers for the attribute table and the array dataset.

pub mod error;
#[cfg(feature = "netcdf")]
pub mod netcdf_file;
pub mod table;
pub mod zarr;

use crate::types::dataset::CamelsDataset;
use crate::types::format::{ArrayFormat, WriteMode};
use error::WriteError;
use std::path::Path;

/// Writes `dataset` in the requested array format.
pub fn write_array(
    dataset: &CamelsDataset,
    path: &Path,
    format: ArrayFormat,
    mode: WriteMode,
    time_chunk: u64,
) -> Result<(), WriteError> {
    match format {
        ArrayFormat::Zarr => zarr::write_zarr(dataset, path, mode, time_chunk),
        #[cfg(feature = "netcdf")]
        ArrayFormat::NetCdf => netcdf_file::write_netcdf(dataset, path, mode),
        #[cfg(not(feature = "netcdf"))]
        ArrayFormat::NetCdf => Err(WriteError::FormatDisabled(format)),
    }
}

/// Applies `mode` to an existing output at `path`.
pub(crate) fn prepare_output(path: &Path, mode: WriteMode) -> Result<(), WriteError> {
    if !path.exists() {
        return Ok(());
    }
    match mode {
        WriteMode::FailIfExists => Err(WriteError::AlreadyExists(path.to_path_buf())),
        WriteMode::Overwrite => {
            log::info!("Removing existing output {:?}", path);
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            };
            removed.map_err(|e| WriteError::RemoveExisting(path.to_path_buf(), e))
        }
    }
}
