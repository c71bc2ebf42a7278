// In: src/error.rs

//! This module defines the single, unified error type for the entire slicer library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every failure in this crate is a configuration problem discovered while a
//! schedule is being built. Nothing here is retryable: the computation is pure,
//! so the same inputs reproduce the same error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlicerError {
    // =========================================================================
    // === Configuration Errors (fatal, raised before any read)
    // =========================================================================
    /// A rule violated by one specific dimension of the dataset.
    #[error("dimension {dim}: {rule}")]
    Configuration { dim: usize, rule: String },

    /// A configuration problem that is not tied to a single dimension.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The requested pattern does not exist for this dataset, or asks for a
    /// direction the data type cannot be sliced in.
    #[error("Data type does not support slicing with pattern '{pattern}' in directions {dims:?}")]
    UnsupportedSlicing { pattern: String, dims: Vec<usize> },

    /// A multi-chunk core dimension combined with a multi-entry iterated span.
    #[error("Unsupported pattern: {0}")]
    UnsupportedPattern(String),

    /// The `(rank, world_size)` pair handed to the distributor is impossible.
    #[error("Invalid process topology: rank {rank} of world size {world_size}")]
    InvalidTopology { rank: usize, world_size: usize },

    #[error("Preview entry '{entry}' could not be parsed: {reason}")]
    PreviewParse { entry: String, reason: String },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error originating from the I/O subsystem (e.g. opening a log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An array could not be assembled with the requested padded shape.
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl SlicerError {
    /// Shorthand for a dimension-scoped configuration error.
    pub(crate) fn dim(dim: usize, rule: impl Into<String>) -> Self {
        SlicerError::Configuration {
            dim,
            rule: rule.into(),
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

#[cfg(feature = "python")]
impl From<SlicerError> for pyo3::PyErr {
    fn from(err: SlicerError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
