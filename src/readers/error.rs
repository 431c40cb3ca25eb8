use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read shapefile '{0}'")]
    Shapefile(PathBuf, #[source] shapefile::Error),

    #[error("Shapefile '{path}' has no usable '{field}' value in record {record}")]
    MissingBasinId {
        path: PathBuf,
        field: String,
        record: usize,
    },

    #[error("Failed to read projection file '{0}'")]
    ProjectionRead(PathBuf, #[source] std::io::Error),

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedProjection(String),

    #[error("Projection parameter '{0}' is missing from the WKT definition")]
    MissingProjectionParameter(String),

    #[error("Invalid attribute file pattern for '{0}'")]
    Pattern(PathBuf, #[source] glob::PatternError),

    #[error("Failed to list attribute files in '{0}'")]
    Listing(PathBuf, #[source] glob::GlobError),

    #[error("No attribute files found in '{0}'")]
    NoAttributeFiles(PathBuf),

    #[error("Cannot derive a category from attribute file name '{0}'")]
    UnrecognizedAttributeFile(PathBuf),

    #[error("Parsing error reading attribute file '{path}'")]
    AttributeCsv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Attribute file '{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Attribute file '{path}' has an empty gauge_id in row {row}")]
    MissingStationId { path: PathBuf, row: usize },

    #[error("Attribute file '{path}' lists station '{station}' more than once")]
    DuplicateStation { path: PathBuf, station: String },

    #[error("Attribute table has no '{0}' column")]
    MissingTableColumn(String),

    #[error("Failed processing attribute table: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to read streamflow file '{0}'")]
    StreamflowIo(PathBuf, #[source] std::io::Error),

    #[error("Malformed streamflow record in '{path}' line {line}: {message}")]
    StreamflowParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Streamflow file '{path}' repeats date {date}")]
    DuplicateDate {
        path: PathBuf,
        date: chrono::NaiveDate,
    },

    #[error("Station '{0}' has no HUC region in the attribute table")]
    MissingHuc(String),
}
