// In: src/slicing/mod.rs

//! The slice-list machinery: grid enumeration, grouping, distribution and padding.
//!
//! Each stage is a pure function over `SliceList`s. The planners in
//! `crate::schedule` chain them in the order each direction requires.

pub mod distributor;
pub mod grid;
pub mod grouper;
pub mod padding;

pub use distributor::{distribute, share_bounds, Share, Topology};
pub use grid::{global_grid, local_grid, slice_dim_mask, FrameGrid};
pub use grouper::{group, split_frames, GroupDim, SplitDirective};
pub use padding::{
    apply_padding, fix_list_length, materialize, pad_array, unpad_selectors, Materialized,
    PadAmount, PadMode, PadShift, PaddingSpec,
};
