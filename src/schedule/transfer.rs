// In: src/schedule/transfer.rs

//! Transfer-granularity planning: which global regions each rank moves.

use crate::error::SlicerError;
use crate::schedule::orchestrator::DatasetPlan;
use crate::schedule::process::transfer_shape;
use crate::schedule::Direction;
use crate::slicing::{
    apply_padding, distribute, fix_list_length, global_grid, group, split_frames, FrameGrid,
    GroupDim, PadShift, Share, Topology,
};
use crate::types::SliceList;

/// The transfer-side output for one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferLists {
    /// The global transfer list, grouped, split and length-fixed but unpadded.
    pub global: SliceList,
    /// This rank's share of `global`, widened by the padding for `In`.
    pub share: Share,
    /// `In` only: the global single list grouped at process granularity.
    pub current: Option<SliceList>,
    /// Unpadded shape of one transfer buffer.
    pub buffer_shape: Vec<usize>,
}

pub struct TransferPlanner<'a> {
    plan: &'a DatasetPlan,
}

impl<'a> TransferPlanner<'a> {
    pub fn new(plan: &'a DatasetPlan) -> Self {
        Self { plan }
    }

    pub fn single_slice_list(&self) -> Result<FrameGrid, SlicerError> {
        global_grid(&self.plan.class, &self.plan.window)
    }

    fn group_dims(&self, grid: &FrameGrid, count: usize) -> Vec<GroupDim> {
        self.plan
            .class
            .slice_dims
            .iter()
            .zip(&grid.lengths)
            .take(count)
            .map(|(&dim, &length)| GroupDim {
                dim,
                length,
                step: self.plan.group_step(dim),
            })
            .collect()
    }

    /// Groups the single list into transfer batches over every slice
    /// dimension, then applies any custom splits.
    pub fn grouped_slice_list(&self, grid: &FrameGrid) -> Result<SliceList, SlicerError> {
        let dims = self.group_dims(grid, grid.lengths.len());
        let grouped = group(&grid.slices, self.plan.config.max_frames_transfer, &dims)?;
        split_frames(&grouped, &self.plan.config.split, &self.plan.shape)
    }

    /// Groups the single list at process granularity along the primary slice
    /// dimension only, in global coordinates.
    pub fn current_slice_list(&self, grid: &FrameGrid) -> Result<SliceList, SlicerError> {
        let dims = self.group_dims(grid, 1);
        group(&grid.slices, self.plan.config.max_frames_process, &dims)
    }

    /// Extends batches along the primary slice dimension so every read has
    /// a fixed frame count.
    ///
    /// With boundary padding every batch is brought up to the process batch
    /// size; otherwise every short batch (the tail of each bank) is brought
    /// up to a full transfer batch. Slower dimensions need no fixing: the
    /// grouper only cuts them into equal blocks.
    pub fn fix_lengths(&self, grid: &FrameGrid, slice_list: &mut SliceList) {
        let Some(dim) = self.plan.primary_slice_dim() else {
            return;
        };
        let bound = self.plan.shape[dim];
        let config = &self.plan.config;
        let full = if config.boundary_padding {
            config.max_frames_process
        } else {
            // A full batch never spans more than the dimension's own radix.
            config.max_frames_transfer.min(grid.lengths[0])
        };
        for entry in slice_list.iter_mut() {
            *entry = fix_list_length(entry, dim, full, bound);
        }
    }

    pub fn plan(&self, direction: Direction, topology: Topology) -> Result<TransferLists, SlicerError> {
        let grid = self.single_slice_list()?;
        let mut global = self.grouped_slice_list(&grid)?;

        let current = match direction {
            Direction::In => {
                let current = self.current_slice_list(&grid)?;
                self.fix_lengths(&grid, &mut global);
                Some(current)
            }
            Direction::Out => None,
        };

        let buffer_shape = match global.first() {
            Some(first) => transfer_shape(first, &self.plan.shape),
            None => {
                log::warn!("pattern {} selects no frames", self.plan.class.pattern);
                self.plan.window.shape()
            }
        };

        let mut share = distribute(&global, topology.rank, topology.world_size)?;
        if direction == Direction::In && self.plan.is_padded() {
            share.slices = apply_padding(
                &share.slices,
                &self.plan.padding,
                &self.plan.shape,
                PadShift::Widen,
            )?;
        }

        log::debug!(
            "{} transfer: {} frames into {} batches, rank {} takes {:?}",
            direction,
            grid.slices.len(),
            global.len(),
            topology.rank,
            share.frames
        );

        Ok(TransferLists {
            global,
            share,
            current,
            buffer_shape,
        })
    }
}
