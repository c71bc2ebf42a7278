// In: src/schedule/process.rs

//! Process-granularity planning inside one transferred buffer.
//!
//! Every transfer buffer of an input has the same unpadded shape (the grouper
//! cuts slow dimensions evenly and short primary tails are length-fixed), so
//! one process list serves every transfer batch of a rank. Coordinates here
//! are local to the buffer: core dimensions are taken whole and slice
//! dimensions count from 0.

use crate::error::SlicerError;
use crate::schedule::orchestrator::DatasetPlan;
use crate::schedule::Direction;
use crate::slicing::{
    apply_padding, fix_list_length, group, local_grid, unpad_selectors, FrameGrid, GroupDim,
    PadShift,
};
use crate::types::{IndexTuple, SliceList};

/// The unpadded buffer shape a transfer batch reads into.
pub fn transfer_shape(entry: &IndexTuple, shape: &[usize]) -> Vec<usize> {
    entry
        .iter()
        .zip(shape)
        .map(|(sel, &bound)| sel.frame_count(bound))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessLists {
    pub process: SliceList,
    pub unpad: Option<SliceList>,
}

pub struct ProcessPlanner<'a> {
    plan: &'a DatasetPlan,
    local_shape: Vec<usize>,
}

impl<'a> ProcessPlanner<'a> {
    pub fn new(plan: &'a DatasetPlan, local_shape: Vec<usize>) -> Result<Self, SlicerError> {
        if local_shape.len() != plan.shape.len() {
            return Err(SlicerError::InternalError(format!(
                "transfer buffer shape {:?} does not match dataset rank {}",
                local_shape,
                plan.shape.len()
            )));
        }
        Ok(Self { plan, local_shape })
    }

    pub fn single_slice_list(&self) -> Result<FrameGrid, SlicerError> {
        local_grid(&self.plan.class, &self.local_shape)
    }

    /// Groups the local single list along the primary slice dimension. Other
    /// slice dimensions form banks that no batch crosses.
    pub fn grouped_slice_list(&self, grid: &FrameGrid) -> Result<SliceList, SlicerError> {
        let dims: Vec<GroupDim> = self
            .plan
            .primary_slice_dim()
            .zip(grid.lengths.first())
            .map(|(dim, &length)| GroupDim {
                dim,
                length,
                step: 1,
            })
            .into_iter()
            .collect();
        group(&grid.slices, self.plan.config.max_frames_process, &dims)
    }

    pub fn plan(&self, direction: Direction) -> Result<ProcessLists, SlicerError> {
        let grid = self.single_slice_list()?;
        let mut process = self.grouped_slice_list(&grid)?;

        let lists = match direction {
            Direction::In => {
                if let (Some(dim), Some(last)) = (self.plan.primary_slice_dim(), process.last_mut()) {
                    let full = self.plan.config.max_frames_process.min(grid.lengths[0]);
                    *last = fix_list_length(last, dim, full, self.local_shape[dim]);
                }
                if self.plan.is_padded() {
                    process = apply_padding(
                        &process,
                        &self.plan.padding,
                        &self.local_shape,
                        PadShift::Extend,
                    )?;
                }
                ProcessLists { process, unpad: None }
            }
            Direction::Out => {
                let unpad = unpad_selectors(&process, &self.plan.padding, &self.local_shape);
                ProcessLists {
                    process,
                    unpad: Some(unpad),
                }
            }
        };

        log::debug!(
            "{} process: buffer {:?} into {} batches of up to {} frames",
            direction,
            self.local_shape,
            lists.process.len(),
            self.plan.config.max_frames_process
        );
        Ok(lists)
    }
}
