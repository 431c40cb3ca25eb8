// Synthetic CAMELS data directory shared by the integration tests
#![allow(dead_code)]

use camels_convert::readers::projection::AlbersEqualArea;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing};
use std::error::Error;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const STATIONS: [&str; 3] = ["01013500", "01022500", "02046000"];

pub const USGS_ALBERS_WKT: &str = r#"PROJCS["USA_Contiguous_Albers_Equal_Area_Conic_USGS_version",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Albers"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-96.0],PARAMETER["Standard_Parallel_1",29.5],PARAMETER["Standard_Parallel_2",45.5],PARAMETER["Latitude_Of_Origin",23.0],UNIT["Meter",1.0]]"#;

const CLIM: &str = "gauge_id;p_mean;high_prec_timing;low_prec_timing
01013500;3.126;son;mam
01022500;3.608;jja;
02046000;3.274;jja;djf
";

const NAME: &str = "gauge_id;huc_02;gauge_name
01013500;01;FISH RIVER NEAR FORT KENT, ME
01022500;01;NARRAGUAGUS RIVER AT CHERRYFIELD, ME
02046000;03;  STONY CREEK NEAR DINWIDDIE VA
";

const TOPO: &str = "gauge_id;gauge_lat;gauge_lon;elev_mean;area_gages2
1013500;47.23739;-68.58264;250.31;2252.7
1022500;44.60797;-67.93524;92.68;573.6
2046000;36.99237;-77.60190;57.63;288.5
";

/// Per-station `(day of January 1980, discharge)` pairs.
pub fn flows() -> [(&'static str, &'static str, Vec<(u32, f64)>); 3] {
    [
        ("01", STATIONS[0], vec![(1, 655.0), (2, 640.0), (3, 625.0)]),
        ("01", STATIONS[1], vec![(2, 10.0), (3, 11.0), (4, -999.0)]),
        ("03", STATIONS[2], vec![(1, 5.0), (4, 6.0)]),
    ]
}

/// Writes the attribute archive, the basin shapefile and the streamflow
/// files of three stations below `data_dir`.
pub fn write_camels_tree(data_dir: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(data_dir)?;
    write_attribute_archive(&data_dir.join("camels_attributes_v2.0.zip"))?;
    write_basin_shapefile(&data_dir.join("HCDN_nhru_final_671.shp"))?;

    let flow_dir = data_dir.join("basin_dataset_public_v1p2").join("usgs_streamflow");
    for (huc, station, days) in flows() {
        let dir = flow_dir.join(huc);
        fs::create_dir_all(&dir)?;
        let mut file = File::create(dir.join(format!("{station}_streamflow_qc.txt")))?;
        for (day, value) in days {
            writeln!(file, "{station} 1980 01 {day:02} {value:>10.2} A")?;
        }
    }
    Ok(())
}

pub fn write_attribute_archive(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = ZipWriter::new(File::create(path)?);
    for (name, content) in [
        ("camels_clim.txt", CLIM),
        ("camels_name.txt", NAME),
        ("camels_topo.txt", TOPO),
    ] {
        writer.start_file(format!("camels_attributes_v2.0/{name}"), SimpleFileOptions::default())?;
        writer.write_all(content.as_bytes())?;
    }
    writer.finish()?;
    Ok(())
}

/// One projected square per station, centred on its gauge.
pub fn write_basin_shapefile(path: &Path) -> Result<(), Box<dyn Error>> {
    let albers = AlbersEqualArea::usgs_conus();
    let table = TableWriterBuilder::new().add_numeric_field(FieldName::try_from("hru_id")?, 10, 0);
    let mut writer = shapefile::Writer::from_path(path, table)?;
    for (id, lon, lat) in [
        (1013500.0, -68.58, 47.24),
        (1022500.0, -67.94, 44.61),
        (2046000.0, -77.60, 36.99),
    ] {
        let (x, y) = albers.forward(lon, lat);
        let ring = vec![
            Point::new(x - 500.0, y - 500.0),
            Point::new(x - 500.0, y + 500.0),
            Point::new(x + 500.0, y + 500.0),
            Point::new(x + 500.0, y - 500.0),
            Point::new(x - 500.0, y - 500.0),
        ];
        let mut record = Record::default();
        record.insert("hru_id".to_string(), FieldValue::Numeric(Some(id)));
        writer.write_shape_and_record(&Polygon::new(PolygonRing::Outer(ring)), &record)?;
    }
    drop(writer);
    fs::write(path.with_extension("prj"), USGS_ALBERS_WKT)?;
    Ok(())
}
