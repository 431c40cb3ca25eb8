//! The labeled (time × station) dataset handed to the array writers.

use serde_json::Value;
use std::collections::BTreeMap;

pub const TIME_DIM: &str = "time";
pub const STATION_DIM: &str = "station_id";
pub const DISCHARGE_VARIABLE: &str = "discharge";

pub const TIME_UNITS: &str = "days since 1970-01-01";
pub const TIME_CALENDAR: &str = "proleptic_gregorian";
pub const DISCHARGE_UNITS: &str = "cfs";

#[derive(Debug, Clone, PartialEq)]
pub enum VariableValues {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Text(Vec<String>),
}

impl VariableValues {
    pub fn len(&self) -> usize {
        match self {
            VariableValues::Float64(v) => v.len(),
            VariableValues::Int64(v) => v.len(),
            VariableValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            VariableValues::Float64(_) => "float64",
            VariableValues::Int64(_) => "int64",
            VariableValues::Text(_) => "string",
        }
    }
}

/// One named array with its dimension names and attributes.
///
/// Values are stored row-major in the order of `dims`.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<u64>,
    pub values: VariableValues,
    pub attrs: BTreeMap<String, Value>,
}

impl Variable {
    pub fn new(name: impl Into<String>, dims: &[(&str, u64)], values: VariableValues) -> Self {
        Self {
            name: name.into(),
            dims: dims.iter().map(|(dim, _)| dim.to_string()).collect(),
            shape: dims.iter().map(|(_, len)| *len).collect(),
            values,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn is_coordinate(&self) -> bool {
        self.dims.len() == 1 && self.dims[0] == self.name
    }
}

/// Discharge and per-station attributes over the `time` and `station_id`
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CamelsDataset {
    variables: Vec<Variable>,
}

impl CamelsDataset {
    /// `variables` must start with the `time` and `station_id` coordinates.
    pub(crate) fn new(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn dimension_len(&self, dim: &str) -> u64 {
        self.variable(dim)
            .map(|v| v.values.len() as u64)
            .unwrap_or_default()
    }

    pub fn time_len(&self) -> u64 {
        self.dimension_len(TIME_DIM)
    }

    pub fn station_len(&self) -> u64 {
        self.dimension_len(STATION_DIM)
    }
}
