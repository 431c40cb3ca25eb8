use crate::readers::error::ReadError;
use crate::readers::projection::SourceCrs;
use crate::types::station_id::StationId;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::{info, warn};
use shapefile::dbase::{FieldValue, Record};
use shapefile::PolygonRing;
use std::collections::HashMap;
use std::path::Path;

/// Basin outlines in EPSG:4326 keyed by station identifier.
///
/// Iteration follows the record order of the shapefile.
#[derive(Debug, Clone, Default)]
pub struct BasinGeometries {
    order: Vec<StationId>,
    shapes: HashMap<StationId, MultiPolygon<f64>>,
}

impl BasinGeometries {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, station: &str) -> Option<&MultiPolygon<f64>> {
        self.shapes.get(station)
    }

    pub fn station_ids(&self) -> &[StationId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StationId, &MultiPolygon<f64>)> {
        self.order
            .iter()
            .filter_map(|id| self.shapes.get(id).map(|shape| (id, shape)))
    }

    /// Adds or replaces the outline of `station`.
    pub fn insert(&mut self, station: StationId, shape: MultiPolygon<f64>) {
        if self.shapes.insert(station.clone(), shape).is_some() {
            warn!("Station {} appears more than once in the basin shapes, keeping the last", station);
        } else {
            self.order.push(station);
        }
    }
}

/// Reads the basin shapefile, reprojecting every outline to longitude/latitude.
///
/// `id_field` names the attribute holding the gauge id; numeric and text
/// fields are both accepted and zero-padded to eight characters.
pub fn read_basin_geometries(path: &Path, id_field: &str) -> Result<BasinGeometries, ReadError> {
    let crs = SourceCrs::for_shapefile(path)?;
    let records = shapefile::read_as::<_, shapefile::Polygon, Record>(path)
        .map_err(|e| ReadError::Shapefile(path.to_path_buf(), e))?;

    let mut basins = BasinGeometries::default();
    for (index, (polygon, record)) in records.into_iter().enumerate() {
        let station = station_id(&record, id_field).ok_or_else(|| ReadError::MissingBasinId {
            path: path.to_path_buf(),
            field: id_field.to_string(),
            record: index,
        })?;
        basins.insert(station, to_multipolygon(polygon.rings(), &crs));
    }
    info!("Read {} basin outlines from {:?}", basins.len(), path);
    Ok(basins)
}

fn station_id(record: &Record, field: &str) -> Option<StationId> {
    match record.get(field)? {
        FieldValue::Numeric(Some(value)) => Some(StationId::from_numeric(*value)),
        FieldValue::Double(value) => Some(StationId::from_numeric(*value)),
        FieldValue::Float(Some(value)) => Some(StationId::from_numeric(f64::from(*value))),
        FieldValue::Integer(value) => Some(StationId::new(&value.to_string())),
        FieldValue::Character(Some(value)) if !value.trim().is_empty() => Some(StationId::new(value)),
        _ => None,
    }
}

/// Groups shapefile rings into polygons: every outer ring opens a polygon and
/// the inner rings that follow it become its holes.
fn to_multipolygon(rings: &[PolygonRing<shapefile::Point>], crs: &SourceCrs) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        let line = LineString::from(
            ring.points()
                .iter()
                .map(|point| {
                    let (x, y) = crs.to_wgs84(point.x, point.y);
                    Coord { x, y }
                })
                .collect::<Vec<_>>(),
        );
        match (ring, polygons.last_mut()) {
            (PolygonRing::Inner(_), Some((_, holes))) => holes.push(line),
            _ => polygons.push((line, Vec::new())),
        }
    }
    MultiPolygon(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}
