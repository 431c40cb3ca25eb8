//! Converts the CAMELS catchment dataset from its distributed text files and
//! shapefile into a columnar attribute table and a (time × station) array
//! store.
//!
//! The [`CamelsConverter`] runs the whole pipeline; the stage functions in
//! [`readers`], [`assemble`] and [`writers`] can be used on their own.
//!
//! # Geometry in the attribute table
//!
//! The `geometry` column of the Feather or Parquet table is a plain `Binary`
//! column of little-endian ISO WKB multipolygons in EPSG:4326, one per
//! station (null when the basin has no outline). No GeoArrow or GeoParquet
//! `geo` schema metadata is written, so geopandas sees raw bytes; restore the
//! shapes with `geopandas.GeoSeries.from_wkb(df["geometry"], crs="EPSG:4326")`.

pub mod assemble;
mod camels;
mod config;
mod error;
pub mod extract;
pub mod fetch;
pub mod progress;
pub mod readers;
mod types;
mod utils;
pub mod writers;

pub use camels::{CamelsConverter, ConversionSummary};
pub use config::{ConverterConfig, DataLayout, DEFAULT_CHUNK_SIZE, DEFAULT_DOWNLOAD_WORKERS};
pub use error::CamelsError;

pub use types::dataset::*;
pub use types::format::{ArrayFormat, TableFormat, WriteMode};
pub use types::source::{default_source_urls, DataSource, CAMELS_ARCHIVES};
pub use types::station_id::{StationId, STATION_ID_WIDTH};

pub use fetch::downloader::{Downloader, FetchReport};
pub use fetch::error::FetchError;
pub use progress::{ConsoleProgress, NoProgress, ProgressSink};
pub use readers::attributes::BasinAttributes;
pub use readers::error::ReadError;
pub use readers::geometry::BasinGeometries;
pub use readers::streamflow::{StationSeries, StreamflowTable};
pub use writers::error::WriteError;
