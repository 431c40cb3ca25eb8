//! Parsers for the extracted CAMELS inputs: basin shapes, attribute tables
//! and per-station streamflow files.

pub mod attributes;
pub mod error;
pub mod gauge_name;
pub mod geometry;
pub mod projection;
pub mod streamflow;
pub mod wkb;
