// In: src/ffi/python.rs

//! The Python surface of the slicer.
//!
//! Everything crosses the boundary as JSON strings: the framework already holds
//! its dataset and plugin descriptions as plain dictionaries, and the selector
//! lists come back as JSON the caller turns into index tuples.

use pyo3::prelude::*;

use crate::observability;
use crate::schedule::{plan_from_json, Direction};
use crate::slicing::{materialize, Topology};
use crate::types::IndexTuple;

//==================================================================================
// I. Planning API
//==================================================================================

/// Builds the slice-list dictionary for one rank and returns it as JSON.
#[pyfunction]
#[pyo3(
    name = "plan_slice_lists",
    signature = (dataset_json, config_json, direction, rank = 0, world_size = 1)
)]
pub fn plan_slice_lists_py(
    py: Python<'_>,
    dataset_json: &str,
    config_json: &str,
    direction: &str,
    rank: usize,
    world_size: usize,
) -> PyResult<String> {
    let direction: Direction = direction.parse()?;
    let topology = Topology::new(rank, world_size)?;
    let dataset_json = dataset_json.to_string();
    let config_json = config_json.to_string();

    let dict = py.allow_threads(move || {
        plan_from_json(&dataset_json, &config_json, direction, topology)
    })?;
    Ok(dict.to_json()?)
}

/// Clips one (possibly padded) JSON index tuple against the real shape.
///
/// Returns the JSON of the clipped selectors and the pad amounts still owed.
#[pyfunction]
#[pyo3(name = "materialize")]
pub fn materialize_py(entry_json: &str, real_shape: Vec<usize>) -> PyResult<String> {
    let entry: IndexTuple = serde_json::from_str(entry_json).map_err(crate::error::SlicerError::from)?;
    let materialized = materialize(&entry, &real_shape)?;
    Ok(serde_json::to_string(&materialized).map_err(crate::error::SlicerError::from)?)
}

//==================================================================================
// II. Diagnostics
//==================================================================================

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    observability::enable_verbose_logging(log_file)?;
    Ok(())
}
