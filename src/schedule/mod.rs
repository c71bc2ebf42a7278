// In: src/schedule/mod.rs

//! Planners that chain the slicing stages into per-process schedules.
//!
//! A schedule is built twice per dataset and plugin: once at transfer
//! granularity (what each process reads from or writes to the backing store)
//! and once at process granularity (what each invocation of the processing
//! routine sees inside a transferred buffer).

pub mod orchestrator;
pub mod process;
pub mod transfer;


use crate::error::SlicerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use orchestrator::{plan_from_json, plan_slice_lists, DatasetPlan, SliceListDict};
pub use process::{transfer_shape, ProcessLists, ProcessPlanner};
pub use transfer::{TransferLists, TransferPlanner};

/// Whether a dataset is read by the plugin or written by it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl FromStr for Direction {
    type Err = SlicerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(SlicerError::InvalidConfig(format!(
                "direction '{}' is neither 'in' nor 'out'",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}
