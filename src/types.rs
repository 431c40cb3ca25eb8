pub mod dataset;
pub mod format;
pub mod source;
pub mod station_id;
