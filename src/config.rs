// In: src/config.rs

//! The configuration surface of the slicer.
//!
//! Two documents describe one scheduling request:
//!
//! - `DatasetDescriptor`: what the loader knows about the data (shape, axis
//!   labels and the access patterns it supports).
//! - `SlicerConfig`: what the plugin asks for (pattern, preview window, padding,
//!   batch sizes and custom splits).
//!
//! Both are plain `serde` structs, built once at the application boundary
//! (typically from JSON handed over by the framework) and then borrowed
//! read-only by the planners.

use crate::error::SlicerError;
use crate::pattern::{FixedDim, PatternSet};
use crate::preview::PreviewEntry;
use crate::slicing::{PaddingSpec, SplitDirective};
use crate::types::{AxisLabel, ShapeEntry};
use serde::{Deserialize, Serialize};

//==================================================================================
// I. Dataset Description
//==================================================================================

/// Static description of one dataset as provided by its loader.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DatasetDescriptor {
    /// Dimension lengths. Symbolic entries are resolved through `axis_labels`.
    pub shape: Vec<ShapeEntry>,

    /// One label per axis, in dimension order. May be empty when the shape is literal.
    #[serde(default)]
    pub axis_labels: Vec<AxisLabel>,

    /// Access patterns registered for this dataset.
    #[serde(default)]
    pub patterns: PatternSet,
}

impl DatasetDescriptor {
    /// A dataset with a literal shape and the given pattern registry.
    pub fn new(shape: &[usize], patterns: PatternSet) -> Self {
        Self {
            shape: shape.iter().map(|&n| ShapeEntry::Fixed(n)).collect(),
            axis_labels: Vec::new(),
            patterns,
        }
    }

    pub fn with_axis_labels(mut self, labels: Vec<AxisLabel>) -> Self {
        self.axis_labels = labels;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SlicerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

//==================================================================================
// II. Slicer Settings
//==================================================================================

/// Per-plugin slicing request for one dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SlicerConfig {
    /// Name of a pattern registered on the dataset.
    pub pattern: String,

    /// Per-dimension preview window; missing trailing entries select everything.
    #[serde(default)]
    pub preview: Vec<PreviewEntry>,

    #[serde(default)]
    pub padding: Option<PaddingSpec>,

    /// Custom `dim.size` splits applied after transfer grouping.
    #[serde(default)]
    pub split: Vec<SplitDirective>,

    /// Axes pinned to one index for the duration of the schedule.
    #[serde(default)]
    pub fixed_dims: Vec<FixedDim>,

    /// Frames per transfer batch (one read/write against the backing store).
    #[serde(default = "default_max_frames")]
    pub max_frames_transfer: usize,

    /// Frames per process batch (one invocation of the processing routine).
    #[serde(default = "default_max_frames")]
    pub max_frames_process: usize,

    /// Pad every process batch up to `max_frames_process`, not just the last one
    /// up to `max_frames_transfer`.
    #[serde(default)]
    pub boundary_padding: bool,
}

impl SlicerConfig {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            preview: Vec::new(),
            padding: None,
            split: Vec::new(),
            fixed_dims: Vec::new(),
            max_frames_transfer: default_max_frames(),
            max_frames_process: default_max_frames(),
            boundary_padding: false,
        }
    }

    pub fn with_max_frames(mut self, transfer: usize, process: usize) -> Self {
        self.max_frames_transfer = transfer;
        self.max_frames_process = process;
        self
    }

    pub fn with_preview(mut self, preview: Vec<PreviewEntry>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_padding(mut self, padding: PaddingSpec) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_split(mut self, split: Vec<SplitDirective>) -> Self {
        self.split = split;
        self
    }

    pub fn with_fixed_dims(mut self, fixed: Vec<FixedDim>) -> Self {
        self.fixed_dims = fixed;
        self
    }

    pub fn with_boundary_padding(mut self, enabled: bool) -> Self {
        self.boundary_padding = enabled;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, SlicerError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that do not depend on the dataset.
    pub fn validate(&self) -> Result<(), SlicerError> {
        if self.max_frames_transfer == 0 || self.max_frames_process == 0 {
            return Err(SlicerError::InvalidConfig(format!(
                "max frames must be at least 1 (transfer {}, process {})",
                self.max_frames_transfer, self.max_frames_process
            )));
        }
        if self.pattern.is_empty() {
            return Err(SlicerError::InvalidConfig("no pattern named".to_string()));
        }
        Ok(())
    }

    /// The padding in effect, or an empty spec.
    pub fn padding_or_default(&self) -> PaddingSpec {
        self.padding.clone().unwrap_or_default()
    }
}

/// Helper for `serde` to default both max-frames settings to single frames.
fn default_max_frames() -> usize {
    1
}
