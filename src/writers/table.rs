use crate::types::format::TableFormat;
use crate::writers::error::WriteError;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Writes the attribute table, geometry column included.
///
/// `geometry` is stored as raw WKB `Binary` without `geo` schema metadata.
pub fn write_table(frame: &mut DataFrame, path: &Path, format: TableFormat) -> Result<(), WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| WriteError::Create(parent.to_path_buf(), e))?;
    }
    let file = File::create(path).map_err(|e| WriteError::Create(path.to_path_buf(), e))?;
    match format {
        TableFormat::Feather => IpcWriter::new(file)
            .finish(frame)
            .map_err(|e| WriteError::Table(path.to_path_buf(), e))?,
        TableFormat::Parquet => {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(frame)
                .map_err(|e| WriteError::Table(path.to_path_buf(), e))?;
        }
    }
    info!(
        "Wrote {} rows x {} columns to {:?} ({})",
        frame.height(),
        frame.width(),
        path,
        format
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PolarsResult<DataFrame> {
        df!(
            "gauge_id" => ["01013500", "01022500"],
            "elev_mean" => [Some(250.31), None],
            "gauge_name" => ["Fish River, ME", "Narraguagus River, ME"],
        )
    }

    #[test]
    fn feather_reads_back() -> Result<(), Box<dyn std::error::Error>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("out").join("attrs.feather");
        let mut frame = sample()?;
        write_table(&mut frame, &path, TableFormat::Feather)?;

        let back = IpcReader::new(File::open(&path)?).finish()?;
        assert!(back.equals_missing(&frame));
        Ok(())
    }

    #[test]
    fn geometry_stays_raw_wkb_binary() -> Result<(), Box<dyn std::error::Error>> {
        use crate::readers::wkb::encode_multipolygon;
        use geo::{polygon, MultiPolygon};

        let square = MultiPolygon(vec![polygon![
            (x: -68.6, y: 47.2),
            (x: -68.5, y: 47.2),
            (x: -68.5, y: 47.3),
            (x: -68.6, y: 47.2),
        ]]);
        let wkb = encode_multipolygon(&square);
        let geometry: BinaryChunked = [Some(wkb.clone()), None].into_iter().collect();
        let mut frame = sample()?;
        frame.with_column(geometry.with_name("geometry".into()).into_series())?;

        let temp = tempfile::tempdir()?;
        let path = temp.path().join("attrs.feather");
        write_table(&mut frame, &path, TableFormat::Feather)?;

        let back = IpcReader::new(File::open(&path)?).finish()?;
        let column = back.column("geometry")?;
        assert_eq!(column.dtype(), &DataType::Binary);
        let stored = column.as_materialized_series().binary()?;
        assert_eq!(stored.get(0), Some(wkb.as_slice()));
        assert_eq!(stored.get(1), None);
        Ok(())
    }

    #[test]
    fn parquet_reads_back() -> Result<(), Box<dyn std::error::Error>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("attrs.parquet");
        let mut frame = sample()?;
        write_table(&mut frame, &path, TableFormat::Parquet)?;

        let back = ParquetReader::new(File::open(&path)?).finish()?;
        assert_eq!(back.get_column_names(), frame.get_column_names());
        assert!(back.equals_missing(&frame));
        Ok(())
    }
}
