//! Single-file NetCDF-4 output.

use crate::types::dataset::{CamelsDataset, Variable, VariableValues, STATION_DIM, TIME_DIM};
use crate::types::format::WriteMode;
use crate::writers::error::WriteError;
use crate::writers::prepare_output;
use log::info;
use serde_json::Value;
use std::path::Path;

pub fn write_netcdf(dataset: &CamelsDataset, path: &Path, mode: WriteMode) -> Result<(), WriteError> {
    prepare_output(path, mode)?;
    let nc_error = |e: netcdf::Error| WriteError::NetCdf(path.to_path_buf(), e);

    let mut file = netcdf::create(path).map_err(nc_error)?;
    file.add_dimension(TIME_DIM, dataset.time_len() as usize)
        .map_err(nc_error)?;
    file.add_dimension(STATION_DIM, dataset.station_len() as usize)
        .map_err(nc_error)?;

    for variable in dataset.variables() {
        write_variable(&mut file, variable).map_err(nc_error)?;
    }

    info!("Wrote {} variables to NetCDF file {:?}", dataset.variables().len(), path);
    Ok(())
}

fn write_variable(file: &mut netcdf::FileMut, variable: &Variable) -> Result<(), netcdf::Error> {
    let dims: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
    let mut var = match &variable.values {
        VariableValues::Float64(values) => {
            let mut var = file.add_variable::<f64>(&variable.name, &dims)?;
            var.put_attribute("_FillValue", f64::NAN)?;
            var.put_values(values, ..)?;
            var
        }
        VariableValues::Int64(values) => {
            let mut var = file.add_variable::<i64>(&variable.name, &dims)?;
            var.put_values(values, ..)?;
            var
        }
        VariableValues::Text(values) => {
            let mut var = file.add_string_variable(&variable.name, &dims)?;
            for (index, value) in values.iter().enumerate() {
                var.put_string(value, index)?;
            }
            var
        }
    };

    for (key, value) in &variable.attrs {
        match value {
            Value::String(text) => var.put_attribute(key, text.as_str())?,
            Value::Number(number) => var.put_attribute(key, number.as_f64().unwrap_or(f64::NAN))?,
            other => var.put_attribute(key, other.to_string())?,
        };
    }
    Ok(())
}
