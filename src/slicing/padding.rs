// In: src/slicing/padding.rs

//! The padding engine.
//!
//! Padding happens in two halves that may run in different processes against
//! different buffer views:
//!
//! 1. **Schedule time** (`apply_padding`): selectors are widened to include the
//!    halo. Starts may go negative and stops may run past the real bound here.
//! 2. **Fetch time** (`materialize`): each selector is clipped to the true
//!    bounds of the array being read, and the clipped-off amounts are reported
//!    so the caller can synthesise them afterwards (`pad_array`).
//!
//! Fixed-length enforcement (`fix_list_length`) deliberately over-reads the
//! primary slice dimension; `materialize` is what keeps that read in bounds.

use crate::error::SlicerError;
use crate::pattern::Classification;
use crate::types::{IndexTuple, Selector, SliceList};
use ndarray::{ArrayD, IxDyn};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

//==================================================================================
// 1. Padding Specification
//==================================================================================

/// How synthetic samples are filled at fetch time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    /// Replicate the boundary sample.
    #[default]
    Edge,
    /// Fill with zero.
    Constant,
    /// Mirror about the boundary sample, without repeating it.
    Reflect,
    /// Continue periodically from the opposite edge.
    Wrap,
}

/// Amount of padding on either side of one dimension.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadAmount {
    #[serde(default)]
    pub before: usize,
    #[serde(default)]
    pub after: usize,
}

impl PadAmount {
    pub fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }

    pub fn is_zero(&self) -> bool {
        self.before == 0 && self.after == 0
    }

    pub fn total(&self) -> usize {
        self.before + self.after
    }
}

/// Per-dimension padding plus the fill mode.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PaddingSpec {
    #[serde(default)]
    pub dims: BTreeMap<usize, PadAmount>,
    #[serde(default)]
    pub mode: PadMode,
}

impl PaddingSpec {
    pub fn new(mode: PadMode) -> Self {
        Self {
            dims: BTreeMap::new(),
            mode,
        }
    }

    pub fn pad(mut self, dim: usize, before: usize, after: usize) -> Self {
        self.dims.insert(dim, PadAmount::new(before, after));
        self
    }

    /// True when no dimension carries any padding.
    pub fn is_empty(&self) -> bool {
        self.dims.values().all(PadAmount::is_zero)
    }

    fn active(&self) -> impl Iterator<Item = (usize, PadAmount)> + '_ {
        self.dims
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(&dim, &amount)| (dim, amount))
    }

    /// Only core dimensions and the primary slice dimension may be padded.
    pub fn validate(&self, class: &Classification) -> Result<(), SlicerError> {
        for (dim, _) in self.active() {
            if dim >= class.ndim {
                return Err(SlicerError::InvalidConfig(format!(
                    "padding names dimension {} of a {}-dimensional dataset",
                    dim, class.ndim
                )));
            }
            if !class.core_dims.contains(&dim) && class.primary_slice_dim() != Some(dim) {
                return Err(SlicerError::dim(
                    dim,
                    "padding is only allowed on core dimensions or the primary slice dimension",
                ));
            }
        }
        Ok(())
    }
}

//==================================================================================
// 2. Schedule-Time Padding
//==================================================================================

/// Where the halo goes when a selector is padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadShift {
    /// Global coordinates: start moves back by `before`, stop forward by `after`.
    Widen,
    /// Local coordinates of an already padded buffer: start stays, stop moves
    /// forward by `before + after`.
    Extend,
}

/// Widens every tuple's padded selectors. `shape` resolves `Full` selectors.
pub fn apply_padding(
    slice_list: &[IndexTuple],
    spec: &PaddingSpec,
    shape: &[usize],
    shift: PadShift,
) -> Result<SliceList, SlicerError> {
    let mut padded = slice_list.to_vec();
    for (dim, amount) in spec.active() {
        let bound = *shape.get(dim).ok_or_else(|| {
            SlicerError::InvalidConfig(format!("padding names dimension {} beyond the shape", dim))
        })?;
        let (inc_start, inc_stop) = match shift {
            PadShift::Widen => (-(amount.before as i64), amount.after as i64),
            PadShift::Extend => (0, amount.total() as i64),
        };
        for tuple in padded.iter_mut() {
            let r = tuple[dim].as_range(bound);
            tuple[dim] = Selector::range(r.start + inc_start, r.stop + inc_stop, r.step);
        }
    }
    Ok(padded)
}

/// Extends (never clips) the primary slice selector to cover `length` frames.
pub fn fix_list_length(entry: &IndexTuple, dim: usize, length: usize, bound: usize) -> IndexTuple {
    let r = entry[dim].as_range(bound);
    let frames = r.frame_count();
    if frames >= length {
        return entry.clone();
    }
    let mut fixed = entry.clone();
    let diff = (length - frames) as i64;
    fixed[dim] = Selector::range(r.start, r.stop + diff * r.step, r.step);
    fixed
}

/// Selectors that strip the padding back off each padded result.
///
/// For a padded dimension the result of processing `entry` is `extent + before
/// + after` long; the unpadded region is `[before, before + extent)`.
pub fn unpad_selectors(
    slice_list: &[IndexTuple],
    spec: &PaddingSpec,
    local_shape: &[usize],
) -> SliceList {
    slice_list
        .iter()
        .map(|entry| {
            let mut unpad = vec![Selector::Full; entry.len()];
            for (dim, amount) in spec.active() {
                if dim >= entry.len() {
                    continue;
                }
                let bound = local_shape.get(dim).copied().unwrap_or(0);
                let extent = entry[dim].frame_count(bound) as i64;
                let before = amount.before as i64;
                unpad[dim] = Selector::range(before, before + extent, 1);
            }
            unpad
        })
        .collect()
}

//==================================================================================
// 3. Fetch-Time Materialization
//==================================================================================

/// A selector tuple that is safe for a bounded read, plus the synthetic
/// padding still owed on each dimension.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub selectors: IndexTuple,
    pub pads: Vec<PadAmount>,
}

impl Materialized {
    pub fn needs_padding(&self) -> bool {
        self.pads.iter().any(|p| !p.is_zero())
    }
}

/// Clips a (possibly padded) tuple against the real array bounds.
///
/// Dimensions that need no synthetic padding pass through unchanged, so
/// materialising an already clipped tuple is a no-op.
pub fn materialize(entry: &IndexTuple, real_shape: &[usize]) -> Result<Materialized, SlicerError> {
    if entry.len() != real_shape.len() {
        return Err(SlicerError::InternalError(format!(
            "tuple of {} selectors materialised against a {}-dimensional shape",
            entry.len(),
            real_shape.len()
        )));
    }

    let mut selectors = entry.clone();
    let mut pads = vec![PadAmount::default(); entry.len()];
    for (dim, (sel, &bound)) in entry.iter().zip(real_shape).enumerate() {
        let Selector::Range(r) = sel else {
            continue;
        };
        let bound = bound as i64;
        let before = (-r.start).max(0);
        let after = (r.stop - bound).max(0);
        if before == 0 && after == 0 {
            continue;
        }
        pads[dim] = PadAmount::new(before as usize, after as usize);
        selectors[dim] = Selector::range(r.start.max(0), r.stop.min(bound), r.step);
    }
    Ok(Materialized { selectors, pads })
}

//==================================================================================
// 4. Array Padding
//==================================================================================

fn source_index(out: usize, before: usize, len: usize, mode: PadMode) -> Option<usize> {
    let i = out as i64 - before as i64;
    let n = len as i64;
    if (0..n).contains(&i) {
        return Some(i as usize);
    }
    let mapped = match mode {
        PadMode::Constant => return None,
        PadMode::Edge => i.clamp(0, n - 1),
        PadMode::Wrap => i.rem_euclid(n),
        PadMode::Reflect if n == 1 => 0,
        PadMode::Reflect => {
            let period = 2 * (n - 1);
            let m = i.rem_euclid(period);
            if m < n {
                m
            } else {
                period - m
            }
        }
    };
    Some(mapped as usize)
}

/// Applies fetch-time pad amounts to an array read with materialised selectors.
pub fn pad_array<T>(array: &ArrayD<T>, pads: &[PadAmount], mode: PadMode) -> Result<ArrayD<T>, SlicerError>
where
    T: Clone + Zero,
{
    if pads.len() != array.ndim() {
        return Err(SlicerError::InternalError(format!(
            "{} pad amounts for a {}-dimensional array",
            pads.len(),
            array.ndim()
        )));
    }
    if pads.iter().all(PadAmount::is_zero) {
        return Ok(array.clone());
    }
    for (dim, (&len, pad)) in array.shape().iter().zip(pads).enumerate() {
        if len == 0 && !pad.is_zero() && mode != PadMode::Constant {
            return Err(SlicerError::dim(dim, "cannot pad an empty dimension from its edges"));
        }
    }

    let src_shape = array.shape().to_vec();
    let out_shape: Vec<usize> = src_shape
        .iter()
        .zip(pads)
        .map(|(&len, p)| len + p.total())
        .collect();

    let mut data = Vec::with_capacity(out_shape.iter().product());
    let mut src = vec![0usize; src_shape.len()];
    for idx in ndarray::indices(IxDyn(&out_shape)) {
        let mut inside = true;
        for d in 0..src_shape.len() {
            match source_index(idx[d], pads[d].before, src_shape[d], mode) {
                Some(s) => src[d] = s,
                None => {
                    inside = false;
                    break;
                }
            }
        }
        data.push(if inside {
            array[IxDyn(&src)].clone()
        } else {
            T::zero()
        });
    }
    Ok(ArrayD::from_shape_vec(IxDyn(&out_shape), data)?)
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{classify, PatternSet};
    use ndarray::{array, Array1};

    fn spec_dim0(before: usize, after: usize) -> PaddingSpec {
        PaddingSpec::new(PadMode::Edge).pad(0, before, after)
    }

    #[test]
    fn test_widen_then_materialize_scenario() {
        let list = vec![vec![Selector::range(9, 10, 1)]];
        let padded = apply_padding(&list, &spec_dim0(2, 1), &[10], PadShift::Widen).unwrap();
        assert_eq!(padded[0][0], Selector::range(7, 11, 1));

        let m = materialize(&padded[0], &[10]).unwrap();
        assert_eq!(m.selectors[0], Selector::range(7, 10, 1));
        assert_eq!(m.pads[0], PadAmount::new(0, 1));
        assert!(m.needs_padding());
    }

    #[test]
    fn test_materialize_negative_start() {
        let padded = apply_padding(
            &[vec![Selector::Index(0), Selector::Full]],
            &spec_dim0(2, 1),
            &[10, 4],
            PadShift::Widen,
        )
        .unwrap();
        let m = materialize(&padded[0], &[10, 4]).unwrap();
        assert_eq!(m.selectors, vec![Selector::range(0, 2, 1), Selector::Full]);
        assert_eq!(m.pads, vec![PadAmount::new(2, 0), PadAmount::default()]);
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let entry = vec![Selector::range(-3, 12, 1), Selector::Index(2), Selector::Full];
        let once = materialize(&entry, &[10, 4, 4]).unwrap();
        let twice = materialize(&once.selectors, &[10, 4, 4]).unwrap();
        assert_eq!(twice.selectors, once.selectors);
        assert!(!twice.needs_padding());
    }

    #[test]
    fn test_roundtrip_recovers_requested_padding() {
        for start in 0..8i64 {
            let list = vec![vec![Selector::range(start, start + 3, 1)]];
            let padded = apply_padding(&list, &spec_dim0(2, 1), &[10], PadShift::Widen).unwrap();
            let m = materialize(&padded[0], &[10]).unwrap();
            let r = padded[0][0].as_range(10);
            assert_eq!(m.pads[0].before as i64, (-r.start).max(0));
            assert_eq!(m.pads[0].after as i64, (r.stop - 10).max(0));
            if start >= 2 && start + 3 + 1 <= 10 {
                assert!(!m.needs_padding());
            }
        }
    }

    #[test]
    fn test_extend_keeps_start() {
        let list = vec![vec![Selector::range(3, 5, 1), Selector::Full]];
        let spec = PaddingSpec::new(PadMode::Edge).pad(0, 2, 1).pad(1, 1, 1);
        let padded = apply_padding(&list, &spec, &[8, 6], PadShift::Extend).unwrap();
        assert_eq!(padded[0], vec![Selector::range(3, 8, 1), Selector::range(0, 8, 1)]);
    }

    #[test]
    fn test_fix_list_length_extends_only() {
        let short = vec![Selector::Index(9), Selector::Full];
        assert_eq!(fix_list_length(&short, 0, 3, 10)[0], Selector::range(9, 12, 1));
        let long = vec![Selector::range(0, 5, 1), Selector::Full];
        assert_eq!(fix_list_length(&long, 0, 3, 10), long);
    }

    #[test]
    fn test_unpad_selectors() {
        let list = vec![vec![Selector::range(0, 3, 1), Selector::Full]];
        let spec = PaddingSpec::new(PadMode::Edge).pad(0, 2, 1).pad(1, 1, 1);
        let unpad = unpad_selectors(&list, &spec, &[3, 6]);
        assert_eq!(unpad[0], vec![Selector::range(2, 5, 1), Selector::range(1, 7, 1)]);
    }

    #[test]
    fn test_validate_rejects_secondary_slice_dim() {
        let class = classify(&PatternSet::tomography_4d(), "PROJECTION", 4, &[]).unwrap();
        assert!(PaddingSpec::new(PadMode::Edge).pad(0, 1, 1).validate(&class).is_ok());
        assert!(PaddingSpec::new(PadMode::Edge).pad(2, 1, 1).validate(&class).is_ok());
        let err = PaddingSpec::new(PadMode::Edge).pad(3, 1, 1).validate(&class).unwrap_err();
        assert!(matches!(err, SlicerError::Configuration { dim: 3, .. }));
    }

    #[test]
    fn test_pad_array_modes() {
        let a: ArrayD<i32> = Array1::from(vec![1, 2, 3]).into_dyn();
        let pads = [PadAmount::new(2, 2)];
        let edge = pad_array(&a, &pads, PadMode::Edge).unwrap();
        assert_eq!(edge.iter().copied().collect::<Vec<_>>(), vec![1, 1, 1, 2, 3, 3, 3]);
        let constant = pad_array(&a, &pads, PadMode::Constant).unwrap();
        assert_eq!(constant.iter().copied().collect::<Vec<_>>(), vec![0, 0, 1, 2, 3, 0, 0]);
        let reflect = pad_array(&a, &pads, PadMode::Reflect).unwrap();
        assert_eq!(reflect.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1, 2, 3, 2, 1]);
        let wrap = pad_array(&a, &pads, PadMode::Wrap).unwrap();
        assert_eq!(wrap.iter().copied().collect::<Vec<_>>(), vec![2, 3, 1, 2, 3, 1, 2]);
    }

    #[test]
    fn test_pad_array_2d_edge() {
        let a = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
        let padded = pad_array(&a, &[PadAmount::new(0, 1), PadAmount::new(1, 0)], PadMode::Edge).unwrap();
        assert_eq!(padded.shape(), &[3, 3]);
        assert_eq!(
            padded.iter().copied().collect::<Vec<f64>>(),
            vec![1.0, 1.0, 2.0, 3.0, 3.0, 4.0, 3.0, 3.0, 4.0]
        );
    }
}
