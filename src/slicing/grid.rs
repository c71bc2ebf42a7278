// In: src/slicing/grid.rs

//! The index-grid builder.
//!
//! Everything in this module reduces to one piece of arithmetic: the
//! chunk/length/repeat triple of each slice dimension. Enumerating the grid in
//! mixed-radix order (first slice dimension fastest) means the column for slice
//! dimension `i` is its candidate row with every value repeated `chunk[i]`
//! times, and that sequence repeated `repeat[i]` times.
//!
//! Downstream grouping relies on this order: consecutive tuples differ only in
//! the fastest-varying dimension until it wraps.

use crate::error::SlicerError;
use crate::pattern::Classification;
use crate::preview::Window;
use crate::types::{Selector, SliceList};

//==================================================================================
// 1. Chunk / Length / Repeat
//==================================================================================

/// How one slice dimension tiles into the flattened grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLengthRepeat {
    /// Consecutive repeats of each index value before it increments.
    pub chunk: usize,
    /// Number of candidate values along the dimension.
    pub length: usize,
    /// Times the chunked sequence is repeated.
    pub repeat: usize,
}

impl ChunkLengthRepeat {
    pub fn total(&self) -> usize {
        self.chunk * self.length * self.repeat
    }
}

/// Derives the chunk/length/repeat triple for every slice dimension from the
/// candidate-row lengths, in slice-dimension order.
pub fn chunk_length_repeat(lengths: &[usize]) -> Vec<ChunkLengthRepeat> {
    if lengths.is_empty() {
        return vec![ChunkLengthRepeat {
            chunk: 1,
            length: 1,
            repeat: 1,
        }];
    }
    (0..lengths.len())
        .map(|i| ChunkLengthRepeat {
            chunk: lengths[..i].iter().product(),
            length: lengths[i],
            repeat: lengths[i + 1..].iter().product(),
        })
        .collect()
}

/// Expands a candidate row into its column of the flattened grid.
pub fn tiled_index<T: Copy>(row: &[T], crl: ChunkLengthRepeat) -> Vec<T> {
    (0..crl.total())
        .map(|p| row[(p / crl.chunk) % crl.length])
        .collect()
}

/// Flattens the candidate rows of all slice dimensions into aligned grid columns.
pub fn slice_index_grid(rows: &[Vec<i64>]) -> Vec<Vec<i64>> {
    let lengths: Vec<usize> = rows.iter().map(|r| r.len()).collect();
    rows.iter()
        .zip(chunk_length_repeat(&lengths))
        .map(|(row, crl)| tiled_index(row, crl))
        .collect()
}

//==================================================================================
// 2. Core and Slice Selectors
//==================================================================================

/// The fixed selector each core dimension takes in every tuple.
pub fn core_selectors(core_dims: &[usize], window: &Window) -> Result<Vec<Selector>, SlicerError> {
    core_dims
        .iter()
        .map(|&dim| {
            let (start, stop, step) = (window.starts[dim], window.stops[dim], window.steps[dim]);
            let chunk = window.chunks[dim] as i64;
            if chunk <= 1 {
                return Ok(Selector::range(start, stop, step));
            }
            if stop - start != 1 {
                return Err(SlicerError::UnsupportedPattern(format!(
                    "core dimension {} has chunk {} over a span of {}; multi-chunk core \
                     dimensions need a single iterated index",
                    dim,
                    chunk,
                    stop - start
                )));
            }
            let half = chunk / 2;
            if start - half < 0 {
                return Err(SlicerError::dim(
                    dim,
                    format!("negative slice index {} in centred core window", start - half),
                ));
            }
            Ok(Selector::range(start - half, start + chunk - half, 1))
        })
        .collect()
}

/// The candidate indices a slice dimension iterates over.
///
/// Chunked dimensions contribute a centred neighbourhood around every iterated
/// point, point by point. A fixed dimension contributes only its pinned value.
pub fn slice_dim_index(
    dim: usize,
    window: &Window,
    fixed: Option<i64>,
) -> Result<Vec<i64>, SlicerError> {
    let (start, stop, step) = (window.starts[dim], window.stops[dim], window.steps[dim]);
    let chunk = window.chunks[dim] as i64;
    if chunk > 1 {
        let half = chunk / 2;
        let mut out = Vec::new();
        for point in (start..stop).step_by(step.max(1) as usize) {
            for c in 0..chunk {
                let idx = point + c - half;
                if idx < 0 {
                    return Err(SlicerError::dim(dim, format!("negative slice index {}", idx)));
                }
                out.push(idx);
            }
        }
        return Ok(out);
    }
    if let Some(value) = fixed {
        return Ok(vec![value]);
    }
    Ok((start..stop).step_by(step.max(1) as usize).collect())
}

/// Marks which indices of a dimension of length `len` a slice dimension touches.
pub fn slice_dim_mask(dim: usize, window: &Window, len: usize) -> Result<Vec<bool>, SlicerError> {
    let mut mask = vec![false; len];
    for idx in slice_dim_index(dim, window, None)? {
        let slot = mask
            .get_mut(idx as usize)
            .ok_or_else(|| SlicerError::dim(dim, format!("slice index {} beyond length {}", idx, len)))?;
        *slot = true;
    }
    Ok(mask)
}

//==================================================================================
// 3. Single Slice List
//==================================================================================

/// Enumerates one index tuple per grid point.
///
/// Core dimensions take `core_selectors`, fixed dimensions their pinned index,
/// slice dimensions the grid value for that point and any other dimension the
/// full range. Without slice dimensions exactly one tuple is produced.
pub fn build(
    ndim: usize,
    core_selectors: &[Selector],
    core_dims: &[usize],
    slice_dims: &[usize],
    fixed: &[(usize, i64)],
    rows: &[Vec<i64>],
) -> Result<SliceList, SlicerError> {
    if rows.len() != slice_dims.len() || core_selectors.len() != core_dims.len() {
        return Err(SlicerError::InternalError(format!(
            "grid inputs misaligned: {} rows for {} slice dims, {} selectors for {} core dims",
            rows.len(),
            slice_dims.len(),
            core_selectors.len(),
            core_dims.len()
        )));
    }

    let mut template = vec![Selector::Full; ndim];
    for (&dim, sel) in core_dims.iter().zip(core_selectors) {
        template[dim] = *sel;
    }
    for &(dim, value) in fixed {
        template[dim] = Selector::Index(value);
    }

    if slice_dims.is_empty() {
        return Ok(vec![template]);
    }

    let columns = slice_index_grid(rows);
    let n_frames = columns.first().map_or(0, |c| c.len());
    let slice_list = (0..n_frames)
        .map(|p| {
            let mut tuple = template.clone();
            for (&dim, column) in slice_dims.iter().zip(&columns) {
                tuple[dim] = Selector::Index(column[p]);
            }
            tuple
        })
        .collect();
    Ok(slice_list)
}

/// A single-frame slice list together with the radix lengths of its slice dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameGrid {
    pub slices: SliceList,
    /// Candidate-row length per slice dimension, in slice-dimension order.
    pub lengths: Vec<usize>,
}

/// The global single slice list of a dataset under a pattern and preview window.
pub fn global_grid(class: &Classification, window: &Window) -> Result<FrameGrid, SlicerError> {
    let cores = core_selectors(&class.core_dims, window)?;
    let rows = class
        .slice_dims
        .iter()
        .map(|&dim| slice_dim_index(dim, window, class.fixed_value(dim)))
        .collect::<Result<Vec<_>, _>>()?;
    let lengths = rows.iter().map(|r| r.len()).collect();
    let slices = build(
        class.ndim,
        &cores,
        &class.core_dims,
        &class.slice_dims,
        &class.fixed,
        &rows,
    )?;
    log_metric!("event" = "global_grid", "pattern" = &class.pattern, "frames" = slices.len());
    Ok(FrameGrid { slices, lengths })
}

/// The single slice list of an already-transferred local buffer.
///
/// Coordinates are local: core dimensions are taken whole, slice dimensions
/// iterate `0..local_shape[dim]` and fixed dimensions sit at index 0.
pub fn local_grid(class: &Classification, local_shape: &[usize]) -> Result<FrameGrid, SlicerError> {
    if local_shape.len() != class.ndim {
        return Err(SlicerError::InvalidConfig(format!(
            "local buffer has {} dimensions, pattern expects {}",
            local_shape.len(),
            class.ndim
        )));
    }
    let cores = vec![Selector::Full; class.core_dims.len()];
    let rows: Vec<Vec<i64>> = class
        .slice_dims
        .iter()
        .map(|&dim| (0..local_shape[dim] as i64).collect())
        .collect();
    let fixed: Vec<(usize, i64)> = class.fixed.iter().map(|&(d, _)| (d, 0)).collect();
    let lengths = rows.iter().map(|r| r.len()).collect();
    let slices = build(class.ndim, &cores, &class.core_dims, &class.slice_dims, &fixed, &rows)?;
    Ok(FrameGrid { slices, lengths })
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{classify, FixedDim, PatternSet};
    use crate::preview::{resolve, PreviewEntry};

    #[test]
    fn test_chunk_length_repeat_triples() {
        let crl = chunk_length_repeat(&[3, 2, 4]);
        assert_eq!(
            crl.iter().map(|c| (c.chunk, c.length, c.repeat)).collect::<Vec<_>>(),
            vec![(1, 3, 8), (3, 2, 4), (6, 4, 1)]
        );
        assert!(crl.iter().all(|c| c.total() == 24));
    }

    #[test]
    fn test_no_slice_dims_gives_unit_triple() {
        assert_eq!(
            chunk_length_repeat(&[]),
            vec![ChunkLengthRepeat { chunk: 1, length: 1, repeat: 1 }]
        );
    }

    #[test]
    fn test_mixed_radix_order_first_dim_fastest() {
        let grid = slice_index_grid(&[vec![0, 1, 2], vec![10, 20]]);
        assert_eq!(grid[0], vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(grid[1], vec![10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn test_projection_single_slice_list() {
        let mut set = PatternSet::new();
        set.add_pattern("PROJECTION", &[1, 2], &[0]);
        let class = classify(&set, "PROJECTION", 3, &[]).unwrap();
        let window = resolve(&[10, 4, 4], &[]).unwrap();
        let grid = global_grid(&class, &window).unwrap();

        assert_eq!(grid.slices.len(), 10);
        assert_eq!(grid.lengths, vec![10]);
        for (i, tuple) in grid.slices.iter().enumerate() {
            assert_eq!(
                tuple,
                &vec![
                    Selector::Index(i as i64),
                    Selector::range(0, 4, 1),
                    Selector::range(0, 4, 1)
                ]
            );
        }
    }

    #[test]
    fn test_all_core_gives_one_entry() {
        let mut set = PatternSet::new();
        set.add_pattern("VOLUME", &[0, 1, 2], &[]);
        let class = classify(&set, "VOLUME", 3, &[]).unwrap();
        let preview: Vec<PreviewEntry> = vec!["2:8".parse().unwrap()];
        let window = resolve(&[10, 4, 4], &preview).unwrap();
        let grid = global_grid(&class, &window).unwrap();
        assert_eq!(
            grid.slices,
            vec![vec![
                Selector::range(2, 8, 1),
                Selector::range(0, 4, 1),
                Selector::range(0, 4, 1)
            ]]
        );
    }

    #[test]
    fn test_fixed_dims_take_constant_value() {
        let fixed = [FixedDim { dim: 3, value: 1 }];
        let class = classify(&PatternSet::tomography_4d(), "PROJECTION", 4, &fixed).unwrap();
        let window = resolve(&[3, 2, 2, 5], &[]).unwrap();
        let grid = global_grid(&class, &window).unwrap();
        assert_eq!(grid.slices.len(), 3);
        assert!(grid.slices.iter().all(|t| t[3] == Selector::Index(1)));
    }

    #[test]
    fn test_chunked_core_dimension() {
        let window = resolve(&[10, 8], &["4:5:1:3".parse().unwrap()]).unwrap();
        let cores = core_selectors(&[0], &window).unwrap();
        assert_eq!(cores, vec![Selector::range(3, 6, 1)]);
    }

    #[test]
    fn test_chunked_core_over_wide_span_is_unsupported() {
        let window = resolve(&[10, 8], &["2:5:1:3".parse().unwrap()]).unwrap();
        let err = core_selectors(&[0], &window).unwrap_err();
        assert!(matches!(err, SlicerError::UnsupportedPattern(_)));
    }

    #[test]
    fn test_chunked_slice_dimension_is_point_major() {
        let window = resolve(&[10], &["2:6:2:3".parse().unwrap()]).unwrap();
        assert_eq!(slice_dim_index(0, &window, None).unwrap(), vec![1, 2, 3, 3, 4, 5]);
        let mask = slice_dim_mask(0, &window, 10).unwrap();
        assert_eq!(mask.iter().filter(|&&b| b).count(), 5);
        assert!(!mask[0] && mask[1] && !mask[6]);
    }

    #[test]
    fn test_chunked_slice_dimension_before_zero_fails() {
        let window = resolve(&[10], &["0:4:1:3".parse().unwrap()]).unwrap();
        let err = slice_dim_index(0, &window, None).unwrap_err();
        assert_eq!(err.to_string(), "dimension 0: negative slice index -1");
    }

    #[test]
    fn test_local_grid_uses_local_coordinates() {
        let class = classify(&PatternSet::tomography_3d(), "SINOGRAM", 3, &[]).unwrap();
        let grid = local_grid(&class, &[6, 3, 5]).unwrap();
        assert_eq!(grid.slices.len(), 3);
        assert_eq!(grid.slices[2], vec![Selector::Full, Selector::Index(2), Selector::Full]);
    }
}
