//! This file is the root of the `slicer` Rust crate.
//!
//! The crate turns a dataset description and a plugin's slicing request into
//! ordered lists of index tuples: which regions each process transfers, and
//! which sub-regions of every transferred buffer each processing call sees.
//! It never touches the data itself.
//!
//! Its responsibilities here are limited to:
//! 1.  Declaring the top-level modules and re-exporting the public API.
//! 2.  Defining the `#[pymodule]` entry point when built with the `python` feature.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod config;
pub mod error;
pub mod pattern;
pub mod preview;
pub mod schedule;
pub mod slicing;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use config::{DatasetDescriptor, SlicerConfig};
pub use error::SlicerError;
pub use observability::enable_verbose_logging;
pub use schedule::{plan_from_json, plan_slice_lists, DatasetPlan, Direction, SliceListDict};
pub use slicing::Topology;

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `slicer` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn slicer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::plan_slice_lists_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::materialize_py, m)?)?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    // --- Turn on logging for the planners ---
    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    Ok(())
}
