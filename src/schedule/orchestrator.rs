// In: src/schedule/orchestrator.rs

//! The public planning entry point.
//!
//! `plan_slice_lists` is a coordinator only. It resolves nothing itself: the
//! dataset-level facts live in `DatasetPlan`, the transfer lists come from
//! `TransferPlanner`, and the process lists from `ProcessPlanner`.

use crate::config::{DatasetDescriptor, SlicerConfig};
use crate::error::SlicerError;
use crate::pattern::{classify, Classification};
use crate::preview::{resolve_with_labels, Window};
use crate::schedule::process::ProcessPlanner;
use crate::schedule::transfer::TransferPlanner;
use crate::schedule::Direction;
use crate::slicing::{PadMode, PaddingSpec, Topology};
use crate::types::SliceList;
use serde::{Deserialize, Serialize};

//==================================================================================
// 1. Dataset Plan
//==================================================================================

/// Everything about one dataset/plugin pairing that does not depend on the rank.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetPlan {
    /// Resolved (real) dataset shape.
    pub shape: Vec<usize>,
    pub window: Window,
    pub class: Classification,
    pub config: SlicerConfig,
    pub padding: PaddingSpec,
}

impl DatasetPlan {
    /// Resolves and validates a dataset against a slicer configuration.
    ///
    /// All configuration errors surface here, before any list is built.
    pub fn new(dataset: &DatasetDescriptor, config: &SlicerConfig) -> Result<Self, SlicerError> {
        config.validate()?;
        let (shape, window) =
            resolve_with_labels(&dataset.shape, &dataset.axis_labels, &config.preview)?;
        let class = classify(&dataset.patterns, &config.pattern, shape.len(), &config.fixed_dims)?;

        for &(dim, value) in &class.fixed {
            if value as usize >= shape[dim] {
                return Err(SlicerError::dim(
                    dim,
                    format!("fixed index {} beyond length {}", value, shape[dim]),
                ));
            }
        }

        // Batches already walk slice dims frame by frame.
        if let Some(d) = config.split.iter().find(|d| class.slice_dims.contains(&d.dim)) {
            return Err(SlicerError::dim(d.dim, "cannot split an iterated slice dimension"));
        }

        let padding = config.padding_or_default();
        padding.validate(&class)?;

        log::info!(
            "planning pattern {} over shape {:?} (preview {:?}), transfer {} / process {} frames",
            class.pattern,
            shape,
            window.shape(),
            config.max_frames_transfer,
            config.max_frames_process
        );

        Ok(Self {
            shape,
            window,
            class,
            config: config.clone(),
            padding,
        })
    }

    pub fn primary_slice_dim(&self) -> Option<usize> {
        self.class.primary_slice_dim()
    }

    pub fn is_padded(&self) -> bool {
        !self.padding.is_empty()
    }

    /// The step a grouped range takes along `dim` in global coordinates.
    ///
    /// Chunked dimensions enumerate overlapping neighbourhoods rather than an
    /// arithmetic sequence, so their grouped ranges are contiguous.
    pub fn group_step(&self, dim: usize) -> i64 {
        if self.window.chunks[dim] > 1 {
            1
        } else {
            self.window.steps[dim]
        }
    }
}

//==================================================================================
// 2. Slice List Dictionary
//==================================================================================

/// The named lists one rank needs to move and process its share of a dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SliceListDict {
    pub direction: Direction,
    /// This rank's transfer batches, in global coordinates (padded for `In`).
    pub transfer: SliceList,
    /// Absolute positions of `transfer` in the global transfer list.
    pub frames: Vec<usize>,
    /// The global list grouped at process granularity (`In` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<SliceList>,
    /// Process batches in the local coordinates of one transfer buffer.
    pub process: SliceList,
    /// Selectors stripping padding from each process result (`Out` only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpad: Option<SliceList>,
    /// Unpadded shape of one transfer buffer.
    pub transfer_shape: Vec<usize>,
    /// Fill mode for fetch-time padding.
    pub pad_mode: PadMode,
}

impl SliceListDict {
    /// True when this rank has no transfer batches and can go straight to the barrier.
    pub fn is_idle(&self) -> bool {
        self.transfer.is_empty()
    }

    pub fn to_json(&self) -> Result<String, SlicerError> {
        Ok(serde_json::to_string(self)?)
    }
}

//==================================================================================
// 3. Public Orchestration API
//==================================================================================

/// Builds every slice list one rank needs for one dataset.
pub fn plan_slice_lists(
    direction: Direction,
    plan: &DatasetPlan,
    topology: Topology,
) -> Result<SliceListDict, SlicerError> {
    // Re-validate: a `Topology` can be built field by field.
    let topology = Topology::new(topology.rank, topology.world_size)?;

    // 1. Transfer granularity, global list and this rank's share.
    let transfer = TransferPlanner::new(plan).plan(direction, topology)?;

    // 2. Process granularity inside one transfer buffer.
    let process = ProcessPlanner::new(plan, transfer.buffer_shape.clone())?.plan(direction)?;

    if transfer.share.is_empty() {
        log::info!(
            "rank {} of {}: no {} frames for pattern {}",
            topology.rank,
            topology.world_size,
            direction,
            plan.class.pattern
        );
    }
    log_metric!(
        "event" = "plan_slice_lists",
        "direction" = direction,
        "rank" = topology.rank,
        "global_batches" = transfer.global.len(),
        "local_batches" = transfer.share.slices.len(),
        "process_batches" = process.process.len()
    );

    Ok(SliceListDict {
        direction,
        transfer: transfer.share.slices,
        frames: transfer.share.frames,
        current: transfer.current,
        process: process.process,
        unpad: process.unpad,
        transfer_shape: transfer.buffer_shape,
        pad_mode: plan.padding.mode,
    })
}

/// JSON-in, dictionary-out convenience used at the language boundary.
pub fn plan_from_json(
    dataset_json: &str,
    config_json: &str,
    direction: Direction,
    topology: Topology,
) -> Result<SliceListDict, SlicerError> {
    let dataset = DatasetDescriptor::from_json(dataset_json)?;
    let config = SlicerConfig::from_json(config_json)?;
    let plan = DatasetPlan::new(&dataset, &config)?;
    plan_slice_lists(direction, &plan, topology)
}
