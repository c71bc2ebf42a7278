//! This module defines the core, strongly-typed data representations used
//! throughout the slicer: selectors, index tuples, slice lists and dataset shapes.

pub mod selector;
pub mod shape;

// Re-export the main type(s) for easier access.
pub use selector::{format_tuple, IndexTuple, Selector, SliceList, SliceRange};
pub use shape::{resolve_shape, AxisLabel, ShapeEntry};
