//! Zarr v3 output: one array per dataset variable under the root group. Array
//! dimensions are recorded as `dimension_names`, and the root `zarr.json`
//! carries every child document as inline `consolidated_metadata`.

use crate::types::dataset::{CamelsDataset, Variable, VariableValues, TIME_DIM};
use crate::types::format::WriteMode;
use crate::writers::error::WriteError;
use crate::writers::prepare_output;
use log::{debug, info};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use zarrs::array::codec::GzipCodec;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

pub const CONSOLIDATED_KEY: &str = "consolidated_metadata";
const METADATA_FILE: &str = "zarr.json";
const GZIP_LEVEL: u32 = 5;

/// Writes `dataset` as a Zarr store at `path`.
///
/// `time_chunk` bounds the chunk length along the `time` dimension; every
/// other dimension is stored as a single chunk.
pub fn write_zarr(
    dataset: &CamelsDataset,
    path: &Path,
    mode: WriteMode,
    time_chunk: u64,
) -> Result<(), WriteError> {
    prepare_output(path, mode)?;
    std::fs::create_dir_all(path).map_err(|e| WriteError::Create(path.to_path_buf(), e))?;
    let store = Arc::new(FilesystemStore::new(path).map_err(|e| zarr_error(path, e))?);

    let mut group_attrs = Map::new();
    group_attrs.insert("source".to_string(), json!("CAMELS"));
    GroupBuilder::new()
        .attributes(group_attrs)
        .build(store.clone(), "/")
        .map_err(|e| zarr_error(path, e))?
        .store_metadata()
        .map_err(|e| zarr_error(path, e))?;

    for variable in dataset.variables() {
        write_variable(&store, path, variable, time_chunk)?;
    }

    let consolidated = consolidate(path)?;
    info!(
        "Wrote {} arrays to Zarr store {:?}",
        consolidated["metadata"].as_object().map_or(0, Map::len),
        path
    );
    Ok(())
}

fn zarr_error(path: &Path, err: impl std::fmt::Display) -> WriteError {
    WriteError::Zarr {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn chunk_shape(variable: &Variable, time_chunk: u64) -> Vec<u64> {
    variable
        .dims
        .iter()
        .zip(&variable.shape)
        .map(|(dim, &len)| {
            let len = if dim == TIME_DIM { len.min(time_chunk) } else { len };
            len.max(1)
        })
        .collect()
}

fn write_variable(
    store: &Arc<FilesystemStore>,
    root: &Path,
    variable: &Variable,
    time_chunk: u64,
) -> Result<(), WriteError> {
    let expected: u64 = variable.shape.iter().product();
    if variable.values.len() as u64 != expected {
        return Err(WriteError::ShapeMismatch {
            name: variable.name.clone(),
            expected,
            found: variable.values.len(),
        });
    }

    let attrs: Map<String, Value> = variable
        .attrs
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let chunks = chunk_shape(variable, time_chunk);
    let (data_type, fill_value) = match &variable.values {
        VariableValues::Float64(_) => (DataType::Float64, FillValue::from(f64::NAN)),
        VariableValues::Int64(_) => (DataType::Int64, FillValue::from(0i64)),
        VariableValues::Text(_) => (DataType::String, FillValue::from("")),
    };
    let mut builder = ArrayBuilder::new(
        variable.shape.clone(),
        data_type,
        chunks.try_into().map_err(|e| zarr_error(root, format!("{e:?}")))?,
        fill_value,
    );
    builder
        .attributes(attrs)
        .dimension_names(Some(variable.dims.clone()));
    // strings keep the builder's default vlen codec
    if !matches!(variable.values, VariableValues::Text(_)) {
        let gzip = GzipCodec::new(GZIP_LEVEL).map_err(|e| zarr_error(root, e))?;
        builder.bytes_to_bytes_codecs(vec![Arc::new(gzip)]);
    }

    let array = builder
        .build(store.clone(), &format!("/{}", variable.name))
        .map_err(|e| zarr_error(root, e))?;
    array.store_metadata().map_err(|e| zarr_error(root, e))?;

    if expected > 0 {
        let subset = ArraySubset::new_with_start_shape(vec![0; variable.shape.len()], variable.shape.clone())
            .map_err(|e| zarr_error(root, e))?;
        match &variable.values {
            VariableValues::Float64(v) => array.store_array_subset_elements(&subset, v),
            VariableValues::Int64(v) => array.store_array_subset_elements(&subset, v),
            VariableValues::Text(v) => array.store_array_subset_elements(&subset, v),
        }
        .map_err(|e| zarr_error(root, e))?;
    }
    debug!("Stored Zarr array '{}' with shape {:?}", variable.name, variable.shape);
    Ok(())
}

/// Embeds every array `zarr.json` below `root` into the root group document
/// as inline `consolidated_metadata`, keyed by node path.
pub fn consolidate(root: &Path) -> Result<Value, WriteError> {
    let root_doc_path = root.join(METADATA_FILE);
    let mut documents: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| WriteError::StoreScan(root.to_path_buf(), e))?;
        if !entry.file_type().is_file() || entry.file_name() != METADATA_FILE || entry.path() == root_doc_path {
            continue;
        }
        let node = entry.path().parent().unwrap_or(root);
        let relative = node.strip_prefix(root).unwrap_or(node);
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        documents.push((key, entry.into_path()));
    }

    let mut metadata = Map::new();
    for (key, path) in documents {
        metadata.insert(key, read_document(&path)?);
    }
    let consolidated = json!({
        "kind": "inline",
        "must_understand": false,
        "metadata": metadata,
    });

    let mut root_doc = read_document(&root_doc_path)?;
    let Some(fields) = root_doc.as_object_mut() else {
        return Err(zarr_error(root, "root zarr.json is not an object"));
    };
    fields.insert(CONSOLIDATED_KEY.to_string(), consolidated.clone());
    let body = serde_json::to_string_pretty(&root_doc).map_err(|e| WriteError::MetadataJson(root_doc_path.clone(), e))?;
    std::fs::write(&root_doc_path, body).map_err(|e| WriteError::Create(root_doc_path.clone(), e))?;
    Ok(consolidated)
}

fn read_document(path: &Path) -> Result<Value, WriteError> {
    let text = std::fs::read_to_string(path).map_err(|e| WriteError::MetadataIo(path.to_path_buf(), e))?;
    serde_json::from_str(&text).map_err(|e| WriteError::MetadataJson(path.to_path_buf(), e))
}
