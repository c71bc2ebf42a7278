// In: src/pattern/mod.rs

//! Access patterns and dimension classification.
//!
//! A pattern names the way an algorithm wants to walk a dataset. Projection-wise
//! and sinogram-wise iteration of the same tomography volume are two patterns
//! over identical data. Each pattern splits the axes into `core` dimensions
//! (consumed whole per invocation) and `slice` dimensions (iterated); the caller
//! may additionally pin some axes to a fixed index, which turns them into
//! `fixed` dimensions for the duration of a schedule.

use crate::error::SlicerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

//==================================================================================
// 1. Pattern Definitions
//==================================================================================

/// A named core/slice split as declared by a loader. Negative dimensions count
/// from the last axis (`-1` is the last dimension).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PatternDef {
    pub core_dims: Vec<isize>,
    pub slice_dims: Vec<isize>,
}

/// A dimension pinned to one externally supplied index.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDim {
    pub dim: isize,
    pub value: i64,
}

/// The registry of patterns a dataset supports, keyed by name.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PatternSet {
    patterns: BTreeMap<String, PatternDef>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(
        &mut self,
        name: &str,
        core_dims: &[isize],
        slice_dims: &[isize],
    ) -> &mut Self {
        self.patterns.insert(
            name.to_string(),
            PatternDef {
                core_dims: core_dims.to_vec(),
                slice_dims: slice_dims.to_vec(),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&PatternDef> {
        self.patterns.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.patterns.keys().map(|k| k.as_str())
    }

    /// Projection and sinogram patterns for `(rotation_angle, detector_y, detector_x)` data.
    pub fn tomography_3d() -> Self {
        let (rot, det_y, det_x) = (0, 1, 2);
        let mut set = Self::new();
        set.add_pattern("PROJECTION", &[det_x, det_y], &[rot])
            .add_pattern("SINOGRAM", &[det_x, rot], &[det_y]);
        set
    }

    /// As `tomography_3d`, with a trailing scan axis iterated after the primary slice dimension.
    pub fn tomography_4d() -> Self {
        let (rot, det_y, det_x, scan) = (0, 1, 2, 3);
        let mut set = Self::new();
        set.add_pattern("PROJECTION", &[det_x, det_y], &[rot, scan])
            .add_pattern("SINOGRAM", &[det_x, rot], &[det_y, scan]);
        set
    }
}

//==================================================================================
// 2. Classification
//==================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimRole {
    Core,
    Slice,
    Fixed,
}

/// The disjoint, exhaustive core/slice/fixed split of a dataset's axes under one pattern.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pattern: String,
    pub ndim: usize,
    pub core_dims: Vec<usize>,
    /// Iterated dimensions, fastest-varying first.
    pub slice_dims: Vec<usize>,
    /// `(dimension, pinned index)` pairs.
    pub fixed: Vec<(usize, i64)>,
}

impl Classification {
    /// The first slice dimension; the one batches grow along.
    pub fn primary_slice_dim(&self) -> Option<usize> {
        self.slice_dims.first().copied()
    }

    pub fn fixed_value(&self, dim: usize) -> Option<i64> {
        self.fixed.iter().find(|(d, _)| *d == dim).map(|(_, v)| *v)
    }

    pub fn role(&self, dim: usize) -> Option<DimRole> {
        if self.core_dims.contains(&dim) {
            Some(DimRole::Core)
        } else if self.slice_dims.contains(&dim) {
            Some(DimRole::Slice)
        } else if self.fixed_value(dim).is_some() {
            Some(DimRole::Fixed)
        } else {
            None
        }
    }
}

fn normalise(dim: isize, ndim: usize) -> Result<usize, SlicerError> {
    let resolved = if dim < 0 { ndim as isize + dim } else { dim };
    if resolved < 0 || resolved >= ndim as isize {
        return Err(SlicerError::InvalidConfig(format!(
            "pattern dimension {} is out of range for a {}-dimensional dataset",
            dim, ndim
        )));
    }
    Ok(resolved as usize)
}

/// Classifies every axis of an `ndim`-dimensional dataset under the named pattern.
///
/// Fixed dimensions may come from the pattern's slice set (they are removed from
/// it) or from axes the pattern leaves unclassified, but never from the core set.
pub fn classify(
    patterns: &PatternSet,
    name: &str,
    ndim: usize,
    fixed: &[FixedDim],
) -> Result<Classification, SlicerError> {
    let def = patterns.get(name).ok_or_else(|| SlicerError::UnsupportedSlicing {
        pattern: name.to_string(),
        dims: Vec::new(),
    })?;

    let core_dims = def
        .core_dims
        .iter()
        .map(|&d| normalise(d, ndim))
        .collect::<Result<Vec<_>, _>>()?;
    let mut slice_dims = def
        .slice_dims
        .iter()
        .map(|&d| normalise(d, ndim))
        .collect::<Result<Vec<_>, _>>()?;

    let mut fixed_pairs = Vec::with_capacity(fixed.len());
    for f in fixed {
        let dim = normalise(f.dim, ndim)?;
        if core_dims.contains(&dim) {
            return Err(SlicerError::dim(dim, "a core dimension cannot be fixed"));
        }
        if fixed_pairs.iter().any(|(d, _)| *d == dim) {
            return Err(SlicerError::dim(dim, "fixed more than once"));
        }
        if f.value < 0 {
            return Err(SlicerError::dim(dim, "negative fixed index"));
        }
        slice_dims.retain(|&d| d != dim);
        fixed_pairs.push((dim, f.value));
    }

    let mut seen = vec![None::<DimRole>; ndim];
    let roles = core_dims
        .iter()
        .map(|&d| (d, DimRole::Core))
        .chain(slice_dims.iter().map(|&d| (d, DimRole::Slice)))
        .chain(fixed_pairs.iter().map(|&(d, _)| (d, DimRole::Fixed)));
    for (dim, role) in roles {
        if let Some(previous) = seen[dim] {
            return Err(SlicerError::dim(
                dim,
                format!("classified as both {:?} and {:?}", previous, role),
            ));
        }
        seen[dim] = Some(role);
    }

    let unclassified: Vec<usize> = (0..ndim).filter(|&d| seen[d].is_none()).collect();
    if !unclassified.is_empty() {
        return Err(SlicerError::UnsupportedSlicing {
            pattern: name.to_string(),
            dims: unclassified,
        });
    }

    log::debug!(
        "pattern {}: core {:?}, slice {:?}, fixed {:?}",
        name,
        core_dims,
        slice_dims,
        fixed_pairs
    );

    Ok(Classification {
        pattern: name.to_string(),
        ndim,
        core_dims,
        slice_dims,
        fixed: fixed_pairs,
    })
}
