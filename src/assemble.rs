//! Builds the array dataset from the attribute table and the joined streamflow.

use crate::readers::attributes::{BasinAttributes, GEOMETRY_COLUMN, STATION_COLUMN};
use crate::readers::error::ReadError;
use crate::readers::streamflow::StreamflowTable;
use crate::types::dataset::{
    CamelsDataset, Variable, VariableValues, DISCHARGE_UNITS, DISCHARGE_VARIABLE, STATION_DIM,
    TIME_CALENDAR, TIME_DIM, TIME_UNITS,
};
use chrono::{DateTime, NaiveDate};
use log::{debug, info};
use polars::prelude::*;
use thiserror::Error;

/// Text written for a missing value of a text attribute.
pub const MISSING_TEXT: &str = "nan";

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(
        "Station order differs between attributes ({attributes} stations) and streamflow ({streamflow} stations), first difference at index {index}"
    )]
    StationMismatch {
        attributes: usize,
        streamflow: usize,
        index: usize,
    },

    #[error("Failed to convert attribute column '{column}'")]
    Column {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error(transparent)]
    Read(#[from] ReadError),
}

pub fn days_since_epoch(date: NaiveDate) -> i64 {
    (date - DateTime::UNIX_EPOCH.date_naive()).num_days()
}

/// Combines `streamflow` and every attribute column except the geometry into
/// one dataset over `time` and `station_id`.
///
/// The stations of both inputs must be identical and in the same order.
pub fn assemble_dataset(
    attributes: &BasinAttributes,
    streamflow: &StreamflowTable,
) -> Result<CamelsDataset, AssembleError> {
    let stations = attributes.station_ids()?;
    if stations != streamflow.stations() {
        let index = stations
            .iter()
            .zip(streamflow.stations())
            .position(|(a, b)| a != b)
            .unwrap_or(stations.len().min(streamflow.stations().len()));
        return Err(AssembleError::StationMismatch {
            attributes: stations.len(),
            streamflow: streamflow.stations().len(),
            index,
        });
    }

    let n_time = streamflow.dates().len() as u64;
    let n_station = stations.len() as u64;

    let mut variables = vec![
        Variable::new(
            TIME_DIM,
            &[(TIME_DIM, n_time)],
            VariableValues::Int64(streamflow.dates().iter().copied().map(days_since_epoch).collect()),
        )
        .with_attr("units", TIME_UNITS)
        .with_attr("calendar", TIME_CALENDAR),
        Variable::new(
            STATION_DIM,
            &[(STATION_DIM, n_station)],
            VariableValues::Text(stations.into_iter().map(|s| s.into_string()).collect()),
        ),
        Variable::new(
            DISCHARGE_VARIABLE,
            &[(TIME_DIM, n_time), (STATION_DIM, n_station)],
            VariableValues::Float64(streamflow.time_major()),
        )
        .with_attr("units", DISCHARGE_UNITS),
    ];

    for column in attributes.frame().get_columns() {
        let name = column.name().as_str();
        if name == STATION_COLUMN || name == GEOMETRY_COLUMN {
            continue;
        }
        let as_text = attributes.text_columns().iter().any(|text| text == name);
        let values = column_values(column.as_materialized_series(), as_text).map_err(|source| {
            AssembleError::Column {
                column: name.to_string(),
                source,
            }
        })?;
        debug!("Attribute '{}' stored as {}", name, values.type_name());
        variables.push(Variable::new(name, &[(STATION_DIM, n_station)], values));
    }

    info!(
        "Assembled dataset with {} variables over {} days x {} stations",
        variables.len(),
        n_time,
        n_station
    );
    Ok(CamelsDataset::new(variables))
}

fn column_values(series: &Series, as_text: bool) -> PolarsResult<VariableValues> {
    let dtype = series.dtype();
    if as_text || !(dtype.is_float() || dtype.is_integer()) {
        let text = series.cast(&DataType::String)?;
        return Ok(VariableValues::Text(
            text.str()?
                .into_iter()
                .map(|v| v.unwrap_or(MISSING_TEXT).to_string())
                .collect(),
        ));
    }
    if dtype.is_integer() && series.null_count() == 0 {
        let ints = series.cast(&DataType::Int64)?;
        return Ok(VariableValues::Int64(ints.i64()?.into_no_null_iter().collect()));
    }
    let floats = series.cast(&DataType::Float64)?;
    Ok(VariableValues::Float64(
        floats.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
    ))
}
