// In: src/slicing/grouper.rs

//! Folds single-frame slice lists into batches.
//!
//! A batch is always a rectangular block of the mixed-radix frame grid, so the
//! range it collapses to never skips over an index discontinuity. With a single
//! grouped dimension this is plain consecutive chunking.

use crate::error::SlicerError;
use crate::slicing::grid::{chunk_length_repeat, tiled_index};
use crate::types::{IndexTuple, Selector, SliceList};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//==================================================================================
// 1. Uniform Grouping
//==================================================================================

/// A dimension collapsed by grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDim {
    pub dim: usize,
    /// Radix length of the dimension in the list's ordering.
    pub length: usize,
    /// Configured step written into the grouped range.
    pub step: i64,
}

/// Cuts a single-frame slice list into batches of at most `max_frames` frames.
///
/// `group_dims` must be the fastest-varying dimensions of the list, fastest
/// first. Any slower dimensions form banks that a batch never crosses. Within a
/// batch every group dimension becomes one range spanning the first frame's
/// start to the last frame's stop; all other selectors are the first frame's.
/// With `max_frames == 1` the list is returned as is.
pub fn group(
    slice_list: &[IndexTuple],
    max_frames: usize,
    group_dims: &[GroupDim],
) -> Result<SliceList, SlicerError> {
    if max_frames == 0 {
        return Err(SlicerError::InvalidConfig(
            "max frames must be at least 1".to_string(),
        ));
    }
    if max_frames == 1 || group_dims.is_empty() || slice_list.is_empty() {
        return Ok(slice_list.to_vec());
    }

    let bank: usize = group_dims.iter().map(|g| g.length).product();
    if bank == 0 || slice_list.len() % bank != 0 {
        return Err(SlicerError::InternalError(format!(
            "slice list of {} frames does not tile into banks of {}",
            slice_list.len(),
            bank
        )));
    }

    let (unit, batch) = batch_geometry(group_dims, max_frames, bank);
    log::debug!(
        "grouping {} frames: banks of {}, units of {}, batches of up to {}",
        slice_list.len(),
        bank,
        unit,
        batch
    );

    let mut grouped = Vec::with_capacity(slice_list.len() / batch + 1);
    for unit_frames in slice_list.chunks(unit) {
        for sub in unit_frames.chunks(batch) {
            grouped.push(group_frames(sub, group_dims));
        }
    }
    Ok(grouped)
}

/// Finds the largest block of whole fast dimensions that fits in `max_frames`,
/// then how many entries of the next dimension it may take.
///
/// Returns `(unit, batch)`: the list is cut into `unit`-frame segments, each
/// segment into batches of `batch` frames. Only a cut through the fastest
/// dimension may leave a shorter last batch; a cut through any slower
/// dimension takes a divisor of its length so every block has the same shape.
fn batch_geometry(group_dims: &[GroupDim], max_frames: usize, bank: usize) -> (usize, usize) {
    let mut block = 1;
    for g in group_dims {
        if block * g.length > max_frames {
            let most = (max_frames / block).min(g.length).max(1);
            let take = if block == 1 {
                most
            } else {
                (1..=most).rev().find(|t| g.length % t == 0).unwrap_or(1)
            };
            return (block * g.length, block * take);
        }
        block *= g.length;
    }
    (bank, bank)
}

fn group_frames(sub: &[IndexTuple], group_dims: &[GroupDim]) -> IndexTuple {
    let first = &sub[0];
    let last = &sub[sub.len() - 1];
    let mut grouped = first.clone();
    for g in group_dims {
        if let (Some(start), Some(stop)) = (first[g.dim].start(), last[g.dim].stop()) {
            grouped[g.dim] = Selector::range(start, stop, g.step);
        }
    }
    grouped
}

//==================================================================================
// 2. Custom Split
//==================================================================================

/// A `dim.size` directive: chop dimension `dim` into pieces of `size` frames.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct SplitDirective {
    pub dim: usize,
    pub size: usize,
}

impl FromStr for SplitDirective {
    type Err = SlicerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || SlicerError::InvalidConfig(format!("split directive '{}' is not 'dim.size'", s));
        let (dim, size) = s.split_once('.').ok_or_else(bad)?;
        let dim = dim.trim().parse().map_err(|_| bad())?;
        let size: usize = size.trim().parse().map_err(|_| bad())?;
        if size == 0 {
            return Err(SlicerError::dim(dim, "split size must be at least 1"));
        }
        Ok(Self { dim, size })
    }
}

impl TryFrom<String> for SplitDirective {
    type Error = SlicerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SplitDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dim, self.size)
    }
}

impl From<SplitDirective> for String {
    fn from(d: SplitDirective) -> String {
        d.to_string()
    }
}

/// Replicates every entry across the Cartesian product of the split pieces.
///
/// Each named dimension's extent (taken from the first entry; `Full` means the
/// whole real dimension) is cut into contiguous pieces of `size * step`
/// indices, the last piece clipped to the real stop. The product is tiled in
/// mixed-radix order, first directive fastest.
pub fn split_frames(
    slice_list: &[IndexTuple],
    directives: &[SplitDirective],
    shape: &[usize],
) -> Result<SliceList, SlicerError> {
    let Some(first) = slice_list.first() else {
        return Ok(Vec::new());
    };
    if directives.is_empty() {
        return Ok(slice_list.to_vec());
    }

    let mut pieces: Vec<Vec<Selector>> = Vec::with_capacity(directives.len());
    for (i, d) in directives.iter().enumerate() {
        if d.dim >= shape.len() {
            return Err(SlicerError::InvalidConfig(format!(
                "split directive {} names a dimension beyond rank {}",
                d,
                shape.len()
            )));
        }
        if directives[..i].iter().any(|o| o.dim == d.dim) {
            return Err(SlicerError::dim(d.dim, "split more than once"));
        }
        let sel = first[d.dim];
        let start = sel.start().unwrap_or(0);
        let stop = sel.stop().unwrap_or(shape[d.dim] as i64);
        let step = sel.step();
        let inc = d.size as i64 * step;
        let dim_pieces: Vec<Selector> = (start..stop)
            .step_by(inc.max(1) as usize)
            .map(|a| Selector::range(a, (a + inc).min(stop), step))
            .collect();
        pieces.push(dim_pieces);
    }

    let lengths: Vec<usize> = pieces.iter().map(|p| p.len()).collect();
    let columns: Vec<Vec<Selector>> = pieces
        .iter()
        .zip(chunk_length_repeat(&lengths))
        .map(|(p, crl)| tiled_index(p, crl))
        .collect();
    let per_entry = columns.first().map_or(0, |c| c.len());

    let mut split = Vec::with_capacity(slice_list.len() * per_entry);
    for entry in slice_list {
        for q in 0..per_entry {
            let mut tuple = entry.clone();
            for (d, column) in directives.iter().zip(&columns) {
                tuple[d.dim] = column[q];
            }
            split.push(tuple);
        }
    }
    log::debug!(
        "split {} entries by {:?} into {}",
        slice_list.len(),
        directives.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        split.len()
    );
    Ok(split)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn frames(n: i64) -> SliceList {
        (0..n)
            .map(|i| vec![Selector::Index(i), Selector::range(0, 4, 1), Selector::range(0, 4, 1)])
            .collect()
    }

    fn primary(length: usize) -> Vec<GroupDim> {
        vec![GroupDim { dim: 0, length, step: 1 }]
    }

    #[test]
    fn test_group_ten_frames_by_three() {
        let grouped = group(&frames(10), 3, &primary(10)).unwrap();
        let ranges: Vec<Selector> = grouped.iter().map(|t| t[0]).collect();
        assert_eq!(
            ranges,
            vec![
                Selector::range(0, 3, 1),
                Selector::range(3, 6, 1),
                Selector::range(6, 9, 1),
                Selector::range(9, 10, 1),
            ]
        );
        assert!(grouped.iter().all(|t| t[1] == Selector::range(0, 4, 1)));
    }

    #[test]
    fn test_max_frames_one_is_identity() {
        let list = frames(7);
        assert_eq!(group(&list, 1, &primary(7)).unwrap(), list);
    }

    #[test]
    fn test_no_group_dims_is_unchanged() {
        let list = frames(4);
        assert_eq!(group(&list, 3, &[]).unwrap(), list);
    }

    #[test]
    fn test_zero_max_frames_is_rejected() {
        assert!(group(&frames(4), 0, &primary(4)).is_err());
    }

    #[test]
    fn test_batch_count_property() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let k = rng.random_range(1..60usize);
            let m = rng.random_range(1..20usize);
            let grouped = group(&frames(k as i64), m, &primary(k)).unwrap();
            assert_eq!(grouped.len(), (k + m - 1) / m);
            let last = grouped.last().unwrap()[0].frame_count(k);
            let expected = if k % m == 0 { m } else { k % m };
            assert_eq!(last, expected, "k={} m={}", k, m);
        }
    }

    #[test]
    fn test_step_is_written_into_grouped_range() {
        let list: SliceList = [0, 2, 4, 6].iter().map(|&i| vec![Selector::Index(i)]).collect();
        let grouped = group(&list, 2, &[GroupDim { dim: 0, length: 4, step: 2 }]).unwrap();
        assert_eq!(grouped, vec![vec![Selector::range(0, 3, 2)], vec![Selector::range(4, 7, 2)]]);
    }

    fn two_dim_grid(l0: i64, l1: i64) -> SliceList {
        (0..l1)
            .flat_map(|j| (0..l0).map(move |i| vec![Selector::Index(i), Selector::Index(j)]))
            .collect()
    }

    #[test]
    fn test_batches_never_cross_a_bank() {
        // Banks of 4 along dim 0; a batch of 3 restarts in every bank.
        let grouped = group(&two_dim_grid(4, 2), 3, &[GroupDim { dim: 0, length: 4, step: 1 }]).unwrap();
        assert_eq!(
            grouped,
            vec![
                vec![Selector::range(0, 3, 1), Selector::Index(0)],
                vec![Selector::range(3, 4, 1), Selector::Index(0)],
                vec![Selector::range(0, 3, 1), Selector::Index(1)],
                vec![Selector::range(3, 4, 1), Selector::Index(1)],
            ]
        );
    }

    #[test]
    fn test_blocks_span_whole_fast_dims() {
        let dims = [
            GroupDim { dim: 0, length: 3, step: 1 },
            GroupDim { dim: 1, length: 4, step: 1 },
        ];
        let grouped = group(&two_dim_grid(3, 4), 7, &dims).unwrap();
        assert_eq!(
            grouped,
            vec![
                vec![Selector::range(0, 3, 1), Selector::range(0, 2, 1)],
                vec![Selector::range(0, 3, 1), Selector::range(2, 4, 1)],
            ]
        );
    }

    #[test]
    fn test_single_frame_tail_is_still_a_range() {
        let grouped = group(&frames(4), 3, &primary(4)).unwrap();
        assert!(grouped.iter().all(|t| matches!(t[0], Selector::Range(_))));
        assert_eq!(grouped[1][0], Selector::range(3, 4, 1));
    }

    #[test]
    fn test_slow_dimension_cut_divides_its_length() {
        // Blocks of 4 along dim 0; 8 frames would take 2 of the 3 entries of
        // dim 1 and leave a 1-entry tail, so one entry per batch is taken.
        let dims = [
            GroupDim { dim: 0, length: 4, step: 1 },
            GroupDim { dim: 1, length: 3, step: 1 },
        ];
        let grouped = group(&two_dim_grid(4, 3), 8, &dims).unwrap();
        assert_eq!(grouped.len(), 3);
        for (j, entry) in grouped.iter().enumerate() {
            let j = j as i64;
            assert_eq!(entry, &vec![Selector::range(0, 4, 1), Selector::range(j, j + 1, 1)]);
        }

        // Dim 1 of length 4 splits evenly in twos.
        let dims = [
            GroupDim { dim: 0, length: 3, step: 1 },
            GroupDim { dim: 1, length: 4, step: 1 },
        ];
        let grouped = group(&two_dim_grid(3, 4), 8, &dims).unwrap();
        assert_eq!(grouped.len(), 2);
        assert!(grouped.iter().all(|t| t[1].frame_count(4) == 2));
    }

    #[test]
    fn test_split_directive_parse() {
        let d: SplitDirective = "1.3".parse().unwrap();
        assert_eq!(d, SplitDirective { dim: 1, size: 3 });
        assert!("1".parse::<SplitDirective>().is_err());
        assert!("1.0".parse::<SplitDirective>().is_err());
    }

    #[test]
    fn test_split_frames_tiles_pieces() {
        let list = vec![
            vec![Selector::Index(0), Selector::Full, Selector::range(0, 4, 1)],
            vec![Selector::Index(1), Selector::Full, Selector::range(0, 4, 1)],
        ];
        let directives = ["1.2".parse().unwrap(), "2.3".parse().unwrap()];
        let split = split_frames(&list, &directives, &[2, 5, 4]).unwrap();

        // dim 1 -> [0,2) [2,4) [4,5); dim 2 -> [0,3) [3,4); 6 pieces per entry.
        assert_eq!(split.len(), 12);
        assert_eq!(split[0][1], Selector::range(0, 2, 1));
        assert_eq!(split[2][1], Selector::range(4, 5, 1));
        assert_eq!(split[3][2], Selector::range(3, 4, 1));
        assert_eq!(split[3][1], Selector::range(0, 2, 1));
        assert_eq!(split[6][0], Selector::Index(1));
    }
}
