use crate::readers::error::ReadError;
use crate::readers::gauge_name::normalize_gauge_name;
use crate::readers::geometry::BasinGeometries;
use crate::readers::wkb::encode_multipolygon;
use crate::types::station_id::StationId;
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const STATION_COLUMN: &str = "gauge_id";
pub const GEOMETRY_COLUMN: &str = "geometry";
pub const GAUGE_NAME_COLUMN: &str = "gauge_name";
pub const HUC_COLUMN: &str = "huc_02";

const ROW_ORDER_COLUMN: &str = "__row_order";

/// Text columns of every known attribute category. Any other column of these
/// categories is read as `Float64`.
const CATEGORY_TEXT_COLUMNS: &[(&str, &[&str])] = &[
    ("clim", &["high_prec_timing", "low_prec_timing"]),
    ("geol", &["geol_1st_class", "geol_2nd_class"]),
    ("hydro", &[]),
    ("name", &[HUC_COLUMN, GAUGE_NAME_COLUMN]),
    ("soil", &[]),
    ("topo", &[]),
    ("vege", &["dom_land_cover"]),
];

/// The combined per-basin attribute table.
///
/// `gauge_id` is the first column, followed by the category columns in the
/// order their files were read and a `geometry` column of WKB bytes.
#[derive(Debug, Clone)]
pub struct BasinAttributes {
    frame: DataFrame,
    text_columns: Vec<String>,
}

impl BasinAttributes {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// String-typed attribute columns, excluding `gauge_id`.
    pub fn text_columns(&self) -> &[String] {
        &self.text_columns
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn station_ids(&self) -> Result<Vec<StationId>, ReadError> {
        let ids = string_column(&self.frame, STATION_COLUMN)?;
        Ok(ids.into_iter().flatten().map(StationId::new).collect())
    }

    /// Every station paired with its HUC region, in table order.
    pub fn huc_regions(&self) -> Result<Vec<(StationId, Option<String>)>, ReadError> {
        let ids = string_column(&self.frame, STATION_COLUMN)?;
        let hucs = string_column(&self.frame, HUC_COLUMN)?;
        Ok(ids
            .into_iter()
            .zip(hucs)
            .filter_map(|(id, huc)| id.map(|id| (StationId::new(id), huc.map(str::to_string))))
            .collect())
    }
}

fn string_column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a StringChunked, ReadError> {
    let column = frame
        .column(name)
        .map_err(|_| ReadError::MissingTableColumn(name.to_string()))?;
    Ok(column.as_materialized_series().str()?)
}

/// Reads every `camels_<category>.txt` file of `dir`, joins them on station
/// id and attaches the basin outlines.
pub fn read_attributes(dir: &Path, geometries: &BasinGeometries) -> Result<BasinAttributes, ReadError> {
    let files = attribute_files(dir)?;
    let mut frames = Vec::with_capacity(files.len());
    for (category, path) in &files {
        let frame = read_category(category, path)?;
        debug!("Read {} rows x {} columns from {:?}", frame.height(), frame.width(), path);
        frames.push(frame);
    }

    let mut frame = join_on_station(&frames)?;
    normalize_gauge_names(&mut frame)?;
    let text_columns = trim_text_columns(&mut frame)?;
    attach_geometry(&mut frame, geometries)?;

    info!(
        "Combined {} attribute files into {} stations x {} columns",
        files.len(),
        frame.height(),
        frame.width()
    );
    Ok(BasinAttributes { frame, text_columns })
}

fn attribute_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, ReadError> {
    let pattern = dir.join("camels_*.txt");
    let entries = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| ReadError::Pattern(dir.to_path_buf(), e))?;
    let mut paths = entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ReadError::Listing(dir.to_path_buf(), e))?;
    if paths.is_empty() {
        return Err(ReadError::NoAttributeFiles(dir.to_path_buf()));
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| {
            let category = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix("camels_"))
                .filter(|category| !category.is_empty())
                .map(str::to_string)
                .ok_or_else(|| ReadError::UnrecognizedAttributeFile(path.clone()))?;
            Ok((category, path))
        })
        .collect()
}

fn text_columns_for(category: &str) -> Option<&'static [&'static str]> {
    CATEGORY_TEXT_COLUMNS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, columns)| *columns)
}

fn read_header(path: &Path) -> Result<Vec<String>, ReadError> {
    let file = File::open(path).map_err(|e| ReadError::AttributeCsv {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| ReadError::AttributeCsv {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
    Ok(line
        .trim_end_matches(['\r', '\n'])
        .split(';')
        .map(|name| name.trim().to_string())
        .collect())
}

/// Builds the full column schema of a known category from the file header.
fn category_schema(header: &[String], text_columns: &[&str]) -> Schema {
    header
        .iter()
        .map(|name| {
            let dtype = if name == STATION_COLUMN || text_columns.contains(&name.as_str()) {
                DataType::String
            } else {
                DataType::Float64
            };
            Field::new(name.as_str().into(), dtype)
        })
        .collect()
}

fn read_category(category: &str, path: &Path) -> Result<DataFrame, ReadError> {
    let header = read_header(path)?;
    if !header.iter().any(|name| name == STATION_COLUMN) {
        return Err(ReadError::MissingColumn {
            path: path.to_path_buf(),
            column: STATION_COLUMN.to_string(),
        });
    }

    let options = match text_columns_for(category) {
        Some(text_columns) => CsvReadOptions::default()
            .with_schema(Some(Arc::new(category_schema(&header, text_columns)))),
        None => {
            warn!(
                "Unknown attribute category '{}' in {:?}, inferring column types",
                category, path
            );
            let overwrite = Schema::from_iter([Field::new(STATION_COLUMN.into(), DataType::String)]);
            CsvReadOptions::default().with_schema_overwrite(Some(Arc::new(overwrite)))
        }
    };

    let mut frame = options
        .with_has_header(true)
        .map_parse_options(|parse| {
            parse
                .with_separator(b';')
                .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| ReadError::AttributeCsv {
            path: path.to_path_buf(),
            source: e,
        })?
        .finish()
        .map_err(|e| ReadError::AttributeCsv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let ids = pad_station_ids(&frame, path)?;
    frame.with_column(ids.into_series())?;
    Ok(frame)
}

/// Zero-pads the raw ids and rejects empty or repeated ones.
fn pad_station_ids(frame: &DataFrame, path: &Path) -> Result<StringChunked, ReadError> {
    let raw = string_column(frame, STATION_COLUMN)?;
    let mut seen = HashSet::with_capacity(raw.len());
    let mut padded = Vec::with_capacity(raw.len());
    for (row, value) in raw.into_iter().enumerate() {
        let station = value
            .filter(|value| !value.trim().is_empty())
            .map(StationId::new)
            .ok_or_else(|| ReadError::MissingStationId {
                path: path.to_path_buf(),
                row,
            })?;
        if !seen.insert(station.clone()) {
            return Err(ReadError::DuplicateStation {
                path: path.to_path_buf(),
                station: station.into_string(),
            });
        }
        padded.push(station.into_string());
    }
    Ok(StringChunked::from_iter_values(
        STATION_COLUMN.into(),
        padded.into_iter(),
    ))
}

/// Outer-joins the category frames on `gauge_id`.
///
/// Stations keep the order in which they are first seen. A column present in
/// more than one file takes the values of the last file.
fn join_on_station(frames: &[DataFrame]) -> Result<DataFrame, ReadError> {
    let mut seen = HashSet::new();
    let mut stations = Vec::new();
    for frame in frames {
        for id in string_column(frame, STATION_COLUMN)?.into_iter().flatten() {
            if seen.insert(id) {
                stations.push(id);
            }
        }
    }

    let index = StringChunked::from_iter_values(STATION_COLUMN.into(), stations.into_iter());
    let mut combined = DataFrame::new(vec![index.into_series().into_column()])?
        .with_row_index(ROW_ORDER_COLUMN.into(), None)?;

    for frame in frames {
        for name in frame.get_column_names() {
            if name.as_str() != STATION_COLUMN && combined.get_column_index(name.as_str()).is_some() {
                warn!("Attribute column '{}' appears in more than one file, keeping the last", name);
                combined = combined.drop(name.as_str())?;
            }
        }
        combined = combined
            .lazy()
            .join(
                frame.clone().lazy(),
                [col(STATION_COLUMN)],
                [col(STATION_COLUMN)],
                JoinArgs::new(JoinType::Left),
            )
            .collect()?;
    }

    let combined = combined.sort([ROW_ORDER_COLUMN], SortMultipleOptions::default())?;
    Ok(combined.drop(ROW_ORDER_COLUMN)?)
}

fn normalize_gauge_names(frame: &mut DataFrame) -> Result<(), ReadError> {
    if frame.get_column_index(GAUGE_NAME_COLUMN).is_none() {
        return Ok(());
    }
    let names: StringChunked = string_column(frame, GAUGE_NAME_COLUMN)?
        .into_iter()
        .map(|name| name.map(normalize_gauge_name))
        .collect();
    frame.with_column(names.with_name(GAUGE_NAME_COLUMN.into()).into_series())?;
    Ok(())
}

/// Trims every String column and returns the names of the text attributes.
fn trim_text_columns(frame: &mut DataFrame) -> Result<Vec<String>, ReadError> {
    let names: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::String)
        .map(|column| column.name().to_string())
        .collect();

    for name in &names {
        let trimmed: StringChunked = string_column(frame, name)?
            .into_iter()
            .map(|value| value.map(str::trim))
            .collect();
        frame.with_column(trimmed.with_name(name.as_str().into()).into_series())?;
    }
    Ok(names.into_iter().filter(|name| name != STATION_COLUMN).collect())
}

fn attach_geometry(frame: &mut DataFrame, geometries: &BasinGeometries) -> Result<(), ReadError> {
    let mut missing = 0usize;
    let wkb: BinaryChunked = string_column(frame, STATION_COLUMN)?
        .into_iter()
        .map(|id| {
            let shape = id.and_then(|id| geometries.get(id)).map(encode_multipolygon);
            if shape.is_none() {
                missing += 1;
            }
            shape
        })
        .collect();
    if missing > 0 {
        warn!("{} stations have no basin outline", missing);
    }
    frame.with_column(wkb.with_name(GEOMETRY_COLUMN.into()).into_series())?;
    Ok(())
}
