//! Output container formats and the overwrite policy for the array store.

use std::fmt;

/// File format of the combined attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TableFormat {
    /// Arrow IPC file (Feather v2). Default, matches what pandas `to_feather` writes.
    #[default]
    Feather,
    /// Apache Parquet with snappy compression.
    Parquet,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Feather => "feather",
            TableFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Format of the (time × station) array output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayFormat {
    /// Directory-backed chunked Zarr store with a consolidated manifest.
    #[default]
    Zarr,
    /// Single self-contained NetCDF-4 file. Requires the `netcdf` feature.
    NetCdf,
}

impl ArrayFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArrayFormat::Zarr => "zarr",
            ArrayFormat::NetCdf => "nc",
        }
    }
}

impl fmt::Display for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// What to do when the array output already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WriteMode {
    /// Remove the existing output before writing.
    #[default]
    Overwrite,
    /// Refuse to touch an existing output.
    FailIfExists,
}
