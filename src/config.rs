//! Run configuration for a CAMELS conversion.
//!
//! Every field has a default matching the pinned CAMELS release, so
//! `ConverterConfig::builder().build()` reproduces the reference conversion.

use crate::types::format::{ArrayFormat, TableFormat, WriteMode};
use crate::types::source::default_source_urls;
use bon::Builder;
use std::path::{Path, PathBuf};

/// Download chunk size used when streaming archives to disk.
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;
/// Number of concurrent download workers.
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 4;

/// Relative locations of the extracted CAMELS inputs inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct DataLayout {
    /// Directory holding the `camels_<category>.txt` attribute files.
    #[builder(into, default = PathBuf::from("camels_attributes_v2.0"))]
    pub attributes_dir: PathBuf,
    /// Basin polygons shapefile.
    #[builder(into, default = PathBuf::from("HCDN_nhru_final_671.shp"))]
    pub basin_shapefile: PathBuf,
    /// Attribute of the shapefile table that carries the gauge id.
    #[builder(into, default = String::from("hru_id"))]
    pub basin_id_field: String,
    /// Root of the per-HUC streamflow folders.
    #[builder(into, default = PathBuf::from("basin_dataset_public_v1p2/usgs_streamflow"))]
    pub streamflow_dir: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Everything a [`crate::CamelsConverter`] needs to know about one run.
///
/// # Examples
///
/// ```
/// use camels_convert::{ArrayFormat, ConverterConfig};
///
/// let config = ConverterConfig::builder()
///     .data_dir("/tmp/camels")
///     .array_format(ArrayFormat::Zarr)
///     .build();
/// assert_eq!(config.download_workers, 4);
/// assert!(config.attributes_dir().ends_with("camels_attributes_v2.0"));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ConverterConfig {
    #[builder(into, default = PathBuf::from("data"))]
    pub data_dir: PathBuf,
    #[builder(default)]
    pub layout: DataLayout,
    #[builder(default = default_source_urls())]
    pub sources: Vec<String>,
    #[builder(into, default = PathBuf::from("camels_attributes_v2.0.feather"))]
    pub table_output: PathBuf,
    #[builder(default)]
    pub table_format: TableFormat,
    #[builder(into, default = PathBuf::from("camels_attrs_v2_streamflow_v1p2.zarr"))]
    pub array_output: PathBuf,
    #[builder(default)]
    pub array_format: ArrayFormat,
    #[builder(default)]
    pub write_mode: WriteMode,
    #[builder(default = DEFAULT_DOWNLOAD_WORKERS)]
    pub download_workers: usize,
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Number of days per chunk along the time axis of the Zarr arrays.
    #[builder(default = 3650)]
    pub time_chunk: u64,
    /// Use whatever is already in `data_dir` without contacting the network.
    #[builder(default)]
    pub skip_download: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConverterConfig {
    pub fn attributes_dir(&self) -> PathBuf {
        self.data_dir.join(&self.layout.attributes_dir)
    }

    pub fn basin_shapefile(&self) -> PathBuf {
        self.data_dir.join(&self.layout.basin_shapefile)
    }

    pub fn streamflow_dir(&self) -> PathBuf {
        self.data_dir.join(&self.layout.streamflow_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_pinned_layout() {
        let config = ConverterConfig::default();
        assert_eq!(config.attributes_dir(), Path::new("data/camels_attributes_v2.0"));
        assert_eq!(
            config.basin_shapefile(),
            Path::new("data/HCDN_nhru_final_671.shp")
        );
        assert_eq!(
            config.streamflow_dir(),
            Path::new("data/basin_dataset_public_v1p2/usgs_streamflow")
        );
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.chunk_size, 32 * 1024);
        assert_eq!(config.write_mode, WriteMode::Overwrite);
    }

    #[test]
    fn layout_is_resolved_against_the_data_dir() {
        let config = ConverterConfig::builder()
            .data_dir("/srv/camels")
            .layout(DataLayout::builder().streamflow_dir("flows").build())
            .build();
        assert_eq!(config.streamflow_dir(), Path::new("/srv/camels/flows"));
        assert_eq!(config.layout.basin_id_field, "hru_id");
    }
}
