use crate::readers::attributes::BasinAttributes;
use crate::readers::error::ReadError;
use crate::types::station_id::StationId;
use chrono::NaiveDate;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Observed daily discharge of one station, in cubic feet per second.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSeries {
    pub station: StationId,
    pub values: BTreeMap<NaiveDate, f64>,
}

/// All station series joined on the union of their dates.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamflowTable {
    dates: Vec<NaiveDate>,
    stations: Vec<StationId>,
    /// `values[station][time]`
    values: Vec<Vec<Option<f64>>>,
}

impl StreamflowTable {
    /// Outer-joins `series` on date. Station order follows the input.
    pub fn outer_join(series: Vec<StationSeries>) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.values.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut stations = Vec::with_capacity(series.len());
        let mut values = Vec::with_capacity(series.len());
        for s in series {
            values.push(dates.iter().map(|date| s.values.get(date).copied()).collect());
            stations.push(s.station);
        }
        Self {
            dates,
            stations,
            values,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn station_values(&self, index: usize) -> Option<&[Option<f64>]> {
        self.values.get(index).map(Vec::as_slice)
    }

    /// Discharge laid out `[time, station]` with missing values as NaN.
    pub fn time_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dates.len() * self.stations.len());
        for t in 0..self.dates.len() {
            out.extend(self.values.iter().map(|column| column[t].unwrap_or(f64::NAN)));
        }
        out
    }
}

pub fn streamflow_path(dir: &Path, huc: &str, station: &StationId) -> PathBuf {
    dir.join(huc).join(format!("{station}_streamflow_qc.txt"))
}

/// Parses one `<gauge_id>_streamflow_qc.txt` file.
///
/// Each line holds `gauge_id year month day discharge [flag]`; the flag is
/// dropped and discharge is kept as written, `-999` included.
pub fn read_station_series(path: &Path, station: StationId) -> Result<StationSeries, ReadError> {
    let text = fs::read_to_string(path).map_err(|e| ReadError::StreamflowIo(path.to_path_buf(), e))?;
    let mut values = BTreeMap::new();

    for (number, line) in text.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let fail = |message: String| ReadError::StreamflowParse {
            path: path.to_path_buf(),
            line: number + 1,
            message,
        };
        if fields.len() < 5 {
            return Err(fail(format!("expected at least 5 fields, found {}", fields.len())));
        }

        let year: i32 = fields[1].parse().map_err(|_| fail(format!("invalid year '{}'", fields[1])))?;
        let month: u32 = fields[2].parse().map_err(|_| fail(format!("invalid month '{}'", fields[2])))?;
        let day: u32 = fields[3].parse().map_err(|_| fail(format!("invalid day '{}'", fields[3])))?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| fail(format!("invalid date {year}-{month}-{day}")))?;
        let discharge: f64 = fields[4]
            .parse()
            .map_err(|_| fail(format!("invalid discharge '{}'", fields[4])))?;

        if values.insert(date, discharge).is_some() {
            return Err(ReadError::DuplicateDate {
                path: path.to_path_buf(),
                date,
            });
        }
    }

    debug!("Read {} days for station {}", values.len(), station);
    Ok(StationSeries { station, values })
}

/// Reads the streamflow file of every station in `attributes` and joins them.
pub fn read_streamflow(dir: &Path, attributes: &BasinAttributes) -> Result<StreamflowTable, ReadError> {
    let mut series = Vec::with_capacity(attributes.len());
    for (station, huc) in attributes.huc_regions()? {
        let huc = huc.ok_or_else(|| ReadError::MissingHuc(station.to_string()))?;
        let path = streamflow_path(dir, &huc, &station);
        series.push(read_station_series(&path, station)?);
    }

    let table = StreamflowTable::outer_join(series);
    info!(
        "Joined streamflow of {} stations over {} days",
        table.stations().len(),
        table.dates().len()
    );
    Ok(table)
}
