//! Reprojection of basin outlines to geographic WGS84 coordinates (EPSG:4326).
//!
//! The CAMELS basin shapefile ships in the USGS flavour of the Albers Equal
//! Area Conic projection. The CRS is read from the `.prj` WKT next to the
//! shapefile and inverted with the ellipsoidal formulas from Snyder,
//! "Map Projections: A Working Manual" (1987), chapter 14.
//!
//! Datum shifts are not applied: NAD83 and WGS84 differ by about a metre,
//! well below the resolution of the basin outlines.

use crate::readers::error::ReadError;
use log::warn;
use regex::Regex;
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::Path;

const MAX_ITERATIONS: usize = 25;
const CONVERGENCE: f64 = 1e-12;

/// Reference ellipsoid given by its semi-major axis and inverse flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub a: f64,
    /// Inverse flattening; `0.0` describes a sphere.
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    fn eccentricity_squared(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            return 0.0;
        }
        let f = 1.0 / self.inverse_flattening;
        2.0 * f - f * f
    }
}

/// Albers Equal Area Conic projection on an ellipsoid.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersEqualArea {
    a: f64,
    e: f64,
    e2: f64,
    /// Central meridian in radians.
    lon0: f64,
    /// False easting/northing in metres.
    false_easting: f64,
    false_northing: f64,
    /// Metres per projected unit.
    unit: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersEqualArea {
    /// Creates the projection from angles in degrees and offsets in metres.
    pub fn new(
        ellipsoid: Ellipsoid,
        lat0_deg: f64,
        lon0_deg: f64,
        parallel1_deg: f64,
        parallel2_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let to_rad = PI / 180.0;
        let e2 = ellipsoid.eccentricity_squared();
        let e = e2.sqrt();
        let a = ellipsoid.a;

        let (phi0, phi1, phi2) = (lat0_deg * to_rad, parallel1_deg * to_rad, parallel2_deg * to_rad);
        let m1 = m(phi1.sin(), phi1.cos(), e2);
        let m2 = m(phi2.sin(), phi2.cos(), e2);
        let q0 = q(phi0.sin(), e, e2);
        let q1 = q(phi1.sin(), e, e2);
        let q2 = q(phi2.sin(), e, e2);

        let n = if (phi1 - phi2).abs() < 1e-10 {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).max(0.0).sqrt() / n;

        Self {
            a,
            e,
            e2,
            lon0: lon0_deg * to_rad,
            false_easting,
            false_northing,
            unit: 1.0,
            n,
            c,
            rho0,
        }
    }

    /// NAD83 / Conus Albers as published by the USGS (EPSG:5070 parameters).
    pub fn usgs_conus() -> Self {
        Self::new(Ellipsoid::GRS80, 23.0, -96.0, 29.5, 45.5, 0.0, 0.0)
    }

    /// Sets the size of one projected unit in metres (`UNIT["Meter",1.0]`).
    pub fn with_unit(mut self, metres_per_unit: f64) -> Self {
        self.unit = metres_per_unit;
        self
    }

    /// Projects geographic degrees to projected coordinates.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let phi = lat_deg * to_rad;
        let rho = self.a * (self.c - self.n * q(phi.sin(), self.e, self.e2)).max(0.0).sqrt() / self.n;
        let theta = self.n * normalize_radians(lon_deg * to_rad - self.lon0);
        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x / self.unit, y / self.unit)
    }

    /// Inverts projected coordinates to `(longitude, latitude)` in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;
        let x = x * self.unit - self.false_easting;
        let dy = self.rho0 - (y * self.unit - self.false_northing);

        let (rho, theta) = if self.n < 0.0 {
            (-(x * x + dy * dy).sqrt(), (-x).atan2(-dy))
        } else {
            ((x * x + dy * dy).sqrt(), x.atan2(dy))
        };
        let q_value = (self.c - rho * rho * self.n * self.n / (self.a * self.a)) / self.n;

        let lon = normalize_radians(self.lon0 + theta / self.n);
        let lat = self.latitude_from_q(q_value);
        (lon * to_deg, lat * to_deg)
    }

    /// Solves q(φ) = `q_value` by fixed-point iteration (Snyder eq. 3-16).
    fn latitude_from_q(&self, q_value: f64) -> f64 {
        if self.e < 1e-12 {
            return (q_value / 2.0).clamp(-1.0, 1.0).asin();
        }
        let q_pole = q(1.0, self.e, self.e2);
        if (q_value.abs() - q_pole.abs()).abs() < 1e-12 {
            return FRAC_PI_2.copysign(q_value);
        }

        let mut phi = (q_value / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..MAX_ITERATIONS {
            let (sin_phi, cos_phi) = phi.sin_cos();
            let one_minus = 1.0 - self.e2 * sin_phi * sin_phi;
            let delta = one_minus * one_minus / (2.0 * cos_phi)
                * (q_value / (1.0 - self.e2) - sin_phi / one_minus
                    + 1.0 / (2.0 * self.e)
                        * ((1.0 - self.e * sin_phi) / (1.0 + self.e * sin_phi)).ln());
            phi += delta;
            if delta.abs() < CONVERGENCE {
                break;
            }
        }
        phi
    }
}

fn m(sin_phi: f64, cos_phi: f64, e2: f64) -> f64 {
    cos_phi / (1.0 - e2 * sin_phi * sin_phi).sqrt()
}

fn q(sin_phi: f64, e: f64, e2: f64) -> f64 {
    if e < 1e-12 {
        return 2.0 * sin_phi;
    }
    (1.0 - e2)
        * (sin_phi / (1.0 - e2 * sin_phi * sin_phi)
            - 1.0 / (2.0 * e) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln())
}

fn normalize_radians(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Coordinate reference system of the basin shapefile.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCrs {
    /// Longitude/latitude degrees; passed through unchanged.
    Geographic,
    Albers(AlbersEqualArea),
}

impl SourceCrs {
    /// Reads the `.prj` file belonging to `shapefile`. A missing file is
    /// assumed to be geographic.
    pub fn for_shapefile(shapefile: &Path) -> Result<Self, ReadError> {
        let prj = shapefile.with_extension("prj");
        match std::fs::read_to_string(&prj) {
            Ok(wkt) => Self::from_wkt(&wkt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No projection file at {:?}, assuming geographic coordinates", prj);
                Ok(SourceCrs::Geographic)
            }
            Err(e) => Err(ReadError::ProjectionRead(prj, e)),
        }
    }

    /// Parses an ESRI/OGC WKT1 definition.
    pub fn from_wkt(wkt: &str) -> Result<Self, ReadError> {
        let wkt = wkt.trim();
        let upper = wkt.to_ascii_uppercase();
        if upper.starts_with("GEOGCS") || upper.starts_with("GEOGCRS") {
            return Ok(SourceCrs::Geographic);
        }
        if !upper.starts_with("PROJCS") {
            return Err(ReadError::UnsupportedProjection(preview(wkt)));
        }

        let projection = first_capture(r#"PROJECTION\s*\[\s*"([^"]+)""#, wkt)
            .ok_or_else(|| ReadError::MissingProjectionParameter("PROJECTION".to_string()))?;
        if !projection.to_ascii_lowercase().contains("albers") {
            return Err(ReadError::UnsupportedProjection(projection));
        }

        let parameters = parameters(wkt);
        let parameter = |names: &[&str]| -> Result<f64, ReadError> {
            names
                .iter()
                .find_map(|name| parameters.iter().find(|(key, _)| key == name).map(|(_, v)| *v))
                .ok_or_else(|| ReadError::MissingProjectionParameter(names[0].to_string()))
        };

        let ellipsoid = spheroid(wkt)
            .ok_or_else(|| ReadError::MissingProjectionParameter("SPHEROID".to_string()))?;
        // The linear unit of a PROJCS is the last UNIT in the definition.
        let unit = numbers(r#"UNIT\s*\[\s*"[^"]*"\s*,\s*([-+0-9.eE]+)"#, wkt)
            .last()
            .copied()
            .unwrap_or(1.0);

        let albers = AlbersEqualArea::new(
            ellipsoid,
            parameter(&["latitude_of_origin", "latitude_of_center"])?,
            parameter(&["central_meridian", "longitude_of_center"])?,
            parameter(&["standard_parallel_1"])?,
            parameter(&["standard_parallel_2"])?,
            parameter(&["false_easting"]).unwrap_or(0.0) * unit,
            parameter(&["false_northing"]).unwrap_or(0.0) * unit,
        )
        .with_unit(unit);
        Ok(SourceCrs::Albers(albers))
    }

    /// Converts one coordinate pair to `(longitude, latitude)` degrees.
    pub fn to_wgs84(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            SourceCrs::Geographic => (x, y),
            SourceCrs::Albers(albers) => albers.inverse(x, y),
        }
    }
}

fn preview(wkt: &str) -> String {
    wkt.chars().take(40).collect()
}

fn first_capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn numbers(pattern: &str, text: &str) -> Vec<f64> {
    let Ok(re) = Regex::new(pattern) else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

fn parameters(wkt: &str) -> Vec<(String, f64)> {
    let Ok(re) = Regex::new(r#"PARAMETER\s*\[\s*"([^"]+)"\s*,\s*([-+0-9.eE]+)\s*\]"#) else {
        return Vec::new();
    };
    re.captures_iter(wkt)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2)?.as_str().parse().ok()?;
            Some((name, value))
        })
        .collect()
}

fn spheroid(wkt: &str) -> Option<Ellipsoid> {
    let re = Regex::new(r#"SPHEROID\s*\[\s*"[^"]*"\s*,\s*([-+0-9.eE]+)\s*,\s*([-+0-9.eE]+)"#).ok()?;
    let caps = re.captures(wkt)?;
    Some(Ellipsoid {
        a: caps.get(1)?.as_str().parse().ok()?,
        inverse_flattening: caps.get(2)?.as_str().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const USGS_ALBERS_WKT: &str = r#"PROJCS["USA_Contiguous_Albers_Equal_Area_Conic_USGS_version",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Albers"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-96.0],PARAMETER["Standard_Parallel_1",29.5],PARAMETER["Standard_Parallel_2",45.5],PARAMETER["Latitude_Of_Origin",23.0],UNIT["Meter",1.0]]"#;

    fn assert_close(actual: (f64, f64), expected: (f64, f64), tolerance: f64) {
        assert!(
            (actual.0 - expected.0).abs() < tolerance && (actual.1 - expected.1).abs() < tolerance,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn projection_origin_maps_to_zero() {
        let albers = AlbersEqualArea::usgs_conus();
        assert_close(albers.forward(-96.0, 23.0), (0.0, 0.0), 1e-6);
        assert_close(albers.inverse(0.0, 0.0), (-96.0, 23.0), 1e-9);
    }

    #[test]
    fn inverse_undoes_forward_across_conus() {
        let albers = AlbersEqualArea::usgs_conus();
        for (lon, lat) in [(-80.42, 37.23), (-122.3, 47.6), (-68.58, 45.5), (-104.9, 31.1)] {
            let (x, y) = albers.forward(lon, lat);
            assert_close(albers.inverse(x, y), (lon, lat), 1e-9);
        }
    }

    #[test]
    fn east_of_the_central_meridian_projects_to_positive_x() {
        let albers = AlbersEqualArea::usgs_conus();
        let (x, _) = albers.forward(-80.0, 40.0);
        assert!(x > 1_000_000.0 && x < 2_000_000.0, "x = {x}");
    }

    #[test]
    fn parses_the_usgs_albers_wkt() -> Result<(), ReadError> {
        let crs = SourceCrs::from_wkt(USGS_ALBERS_WKT)?;
        assert_eq!(crs, SourceCrs::Albers(AlbersEqualArea::usgs_conus()));
        Ok(())
    }

    #[test]
    fn honours_false_origin_and_units() -> Result<(), ReadError> {
        let wkt = USGS_ALBERS_WKT
            .replace(r#""False_Easting",0.0"#, r#""False_Easting",1000.0"#)
            .replace(r#"UNIT["Meter",1.0]]"#, r#"UNIT["Kilometer",1000.0]]"#);
        let crs = SourceCrs::from_wkt(&wkt)?;
        // 1000 km false easting, coordinates in km
        assert_close(crs.to_wgs84(1000.0, 0.0), (-96.0, 23.0), 1e-9);
        Ok(())
    }

    #[test]
    fn geographic_wkt_passes_coordinates_through() -> Result<(), ReadError> {
        let crs = SourceCrs::from_wkt(
            r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#,
        )?;
        assert_eq!(crs.to_wgs84(-80.5, 37.25), (-80.5, 37.25));
        Ok(())
    }

    #[test]
    fn other_projections_are_rejected() {
        let wkt = USGS_ALBERS_WKT.replace(r#"PROJECTION["Albers"]"#, r#"PROJECTION["Mercator"]"#);
        let err = SourceCrs::from_wkt(&wkt).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedProjection(name) if name == "Mercator"));
    }

    #[test]
    fn missing_parallels_are_reported() {
        let wkt = USGS_ALBERS_WKT.replace(r#"PARAMETER["Standard_Parallel_2",45.5],"#, "");
        let err = SourceCrs::from_wkt(&wkt).unwrap_err();
        assert!(matches!(err, ReadError::MissingProjectionParameter(name) if name == "standard_parallel_2"));
    }

    #[test]
    fn missing_prj_defaults_to_geographic() -> Result<(), ReadError> {
        let temp = tempfile::tempdir().map_err(|e| ReadError::ProjectionRead(".".into(), e))?;
        let crs = SourceCrs::for_shapefile(&temp.path().join("basins.shp"))?;
        assert_eq!(crs, SourceCrs::Geographic);
        Ok(())
    }
}
