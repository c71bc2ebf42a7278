// In: src/ffi/mod.rs

//! Language bindings. Compiled only with the `python` feature.

pub mod python;

pub use python::{enable_verbose_logging_py, materialize_py, plan_slice_lists_py};
