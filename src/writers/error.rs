use crate::types::format::ArrayFormat;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output file '{0}'")]
    Create(PathBuf, #[source] std::io::Error),

    #[error("Failed to write table '{0}'")]
    Table(PathBuf, #[source] PolarsError),

    #[error("Output '{0}' already exists")]
    AlreadyExists(PathBuf),

    #[error("Failed to remove existing output '{0}'")]
    RemoveExisting(PathBuf, #[source] std::io::Error),

    #[error("Zarr store error in '{path}': {message}")]
    Zarr { path: PathBuf, message: String },

    #[error("Failed to scan Zarr store '{0}'")]
    StoreScan(PathBuf, #[source] walkdir::Error),

    #[error("Failed to read Zarr metadata '{0}'")]
    MetadataIo(PathBuf, #[source] std::io::Error),

    #[error("Invalid Zarr metadata document '{0}'")]
    MetadataJson(PathBuf, #[source] serde_json::Error),

    #[error("Variable '{name}' holds {found} values but its shape needs {expected}")]
    ShapeMismatch {
        name: String,
        expected: u64,
        found: usize,
    },

    #[error("Array format '{0}' is not enabled in this build")]
    FormatDisabled(ArrayFormat),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error writing '{0}'")]
    NetCdf(PathBuf, #[source] netcdf::Error),
}
