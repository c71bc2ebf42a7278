//! This module defines the canonical, type-safe representation of one component
//! of an index tuple.
//!
//! A `Selector` either takes a whole dimension, pins a single index, or spans a
//! `(start, stop, step)` range. Ranges are allowed to start below zero or stop
//! beyond the real bound of a dimension: that is how schedule-time padding is
//! expressed. Clipping against the true bound happens at fetch time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, stop)` range with a positive step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceRange {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl SliceRange {
    pub fn new(start: i64, stop: i64, step: i64) -> Self {
        Self { start, stop, step }
    }

    /// Number of indices this range visits, ignoring any real bound.
    pub fn frame_count(&self) -> usize {
        if self.stop <= self.start || self.step <= 0 {
            return 0;
        }
        ((self.stop - self.start + self.step - 1) / self.step) as usize
    }
}

/// One component of an index tuple.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// The whole dimension.
    Full,
    /// A single index, equivalent to `[i, i + 1)`.
    Index(i64),
    /// An explicit `(start, stop, step)` range.
    Range(SliceRange),
}

/// One selector per dataset dimension.
pub type IndexTuple = Vec<Selector>;

/// An ordered sequence of index tuples. Order defines frame numbering.
pub type SliceList = Vec<IndexTuple>;

impl Selector {
    pub fn range(start: i64, stop: i64, step: i64) -> Self {
        Selector::Range(SliceRange::new(start, stop, step))
    }

    /// The first index covered, or `None` for `Full`.
    pub fn start(&self) -> Option<i64> {
        match self {
            Selector::Full => None,
            Selector::Index(i) => Some(*i),
            Selector::Range(r) => Some(r.start),
        }
    }

    /// The exclusive end of the selector, or `None` for `Full`.
    pub fn stop(&self) -> Option<i64> {
        match self {
            Selector::Full => None,
            Selector::Index(i) => Some(*i + 1),
            Selector::Range(r) => Some(r.stop),
        }
    }

    pub fn step(&self) -> i64 {
        match self {
            Selector::Range(r) => r.step,
            _ => 1,
        }
    }

    /// Resolves the selector into an explicit range against a dimension length.
    pub fn as_range(&self, bound: usize) -> SliceRange {
        match self {
            Selector::Full => SliceRange::new(0, bound as i64, 1),
            Selector::Index(i) => SliceRange::new(*i, *i + 1, 1),
            Selector::Range(r) => *r,
        }
    }

    /// Number of frames the selector covers along its dimension.
    pub fn frame_count(&self, bound: usize) -> usize {
        self.as_range(bound).frame_count()
    }

    /// The concrete, in-bounds indices this selector visits.
    ///
    /// Callers use this to pick auxiliary per-frame values (rotation angles,
    /// centre-of-rotation estimates) with the same selector that drove a read.
    pub fn indices(&self, bound: usize) -> Vec<usize> {
        let r = self.as_range(bound);
        if r.step <= 0 {
            return Vec::new();
        }
        let stop = r.stop.min(bound as i64);
        let mut out = Vec::new();
        let mut i = r.start;
        while i < stop {
            if i >= 0 {
                out.push(i as usize);
            }
            i += r.step;
        }
        out
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Full => write!(f, ":"),
            Selector::Index(i) => write!(f, "{}", i),
            Selector::Range(r) => write!(f, "{}:{}:{}", r.start, r.stop, r.step),
        }
    }
}

/// Renders a tuple the way a numpy index expression would read, e.g. `[3, 0:4:1, :]`.
pub fn format_tuple(tuple: &[Selector]) -> String {
    let parts: Vec<String> = tuple.iter().map(|s| s.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_unit_range() {
        let s = Selector::Index(7);
        assert_eq!(s.start(), Some(7));
        assert_eq!(s.stop(), Some(8));
        assert_eq!(s.as_range(10), SliceRange::new(7, 8, 1));
        assert_eq!(s.frame_count(10), 1);
    }

    #[test]
    fn test_frame_count_with_step() {
        assert_eq!(SliceRange::new(0, 5, 2).frame_count(), 3);
        assert_eq!(SliceRange::new(0, 4, 2).frame_count(), 2);
        assert_eq!(SliceRange::new(4, 4, 1).frame_count(), 0);
        assert_eq!(Selector::Full.frame_count(12), 12);
    }

    #[test]
    fn test_indices_clip_to_bound() {
        let s = Selector::range(-2, 12, 3);
        assert_eq!(s.indices(10), vec![1, 4, 7]);
        assert_eq!(Selector::Full.indices(3), vec![0, 1, 2]);
    }

    #[test]
    fn test_display_reads_like_an_index_expression() {
        let tuple = vec![Selector::Index(3), Selector::range(0, 4, 1), Selector::Full];
        assert_eq!(format_tuple(&tuple), "[3, 0:4:1, :]");
    }

    #[test]
    fn test_serde_shape_is_stable() {
        let json = serde_json::to_string(&vec![
            Selector::Full,
            Selector::Index(2),
            Selector::range(0, 3, 1),
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"["full",{"index":2},{"range":{"start":0,"stop":3,"step":1}}]"#
        );
    }
}
