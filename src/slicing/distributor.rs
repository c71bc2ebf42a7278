// In: src/slicing/distributor.rs

//! Splits an ordered batch list across SPMD worker processes.
//!
//! Every worker computes the same global list and then takes its own share, so
//! no coordinator is needed and frame numbering agrees cluster-wide.

use crate::error::SlicerError;
use crate::types::{IndexTuple, SliceList};
use serde::{Deserialize, Serialize};

/// This process's position in the worker pool.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub rank: usize,
    pub world_size: usize,
}

impl Topology {
    pub fn new(rank: usize, world_size: usize) -> Result<Self, SlicerError> {
        if world_size == 0 || rank >= world_size {
            return Err(SlicerError::InvalidTopology { rank, world_size });
        }
        Ok(Self { rank, world_size })
    }

    /// A single-process run.
    pub fn single() -> Self {
        Self {
            rank: 0,
            world_size: 1,
        }
    }
}

/// One rank's contiguous share of a slice list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Share {
    pub slices: SliceList,
    /// Absolute positions of `slices` in the global list.
    pub frames: Vec<usize>,
}

impl Share {
    /// An empty share means "nothing to do": go straight to the barrier.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// The `[start, end)` frame range rank `rank` owns out of `n_frames`.
///
/// Sizes differ by at most one and the larger groups come first.
pub fn share_bounds(n_frames: usize, rank: usize, world_size: usize) -> (usize, usize) {
    let base = n_frames / world_size;
    let extra = n_frames % world_size;
    let start = rank * base + rank.min(extra);
    let size = base + usize::from(rank < extra);
    (start, start + size)
}

/// Selects the share of `slice_list` that belongs to `rank`.
///
/// Ranks beyond the available frame count receive an empty share.
pub fn distribute(
    slice_list: &[IndexTuple],
    rank: usize,
    world_size: usize,
) -> Result<Share, SlicerError> {
    let topology = Topology::new(rank, world_size)?;
    let (start, end) = share_bounds(slice_list.len(), topology.rank, topology.world_size);
    if start == end {
        log::debug!(
            "rank {} of {} has no frames out of {}",
            rank,
            world_size,
            slice_list.len()
        );
    }
    Ok(Share {
        slices: slice_list[start..end].to_vec(),
        frames: (start..end).collect(),
    })
}
