// In: src/preview/mod.rs

//! The preview resolver.
//!
//! A preview is a declarative, per-dimension region of interest written as
//! `start:stop:step:chunk`. This module turns a (possibly partial) list of
//! preview entries into a fully resolved `Window` with one concrete
//! `(start, stop, step, chunk)` quadruple per dataset dimension.
//!
//! Bounds may be written as integers or with the keywords `end` (the
//! dimension length) and `mid` (half of it), optionally offset: `mid-5`,
//! `end-1`. Unspecified dimensions, and unspecified fields, default to the
//! full range with step 1 and chunk 1.

use crate::error::SlicerError;
use crate::types::{resolve_shape, AxisLabel, ShapeEntry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//==================================================================================
// 1. Preview Entries
//==================================================================================

/// A bound expression inside a preview entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundExpr {
    Literal(i64),
    /// `end` plus an offset.
    End(i64),
    /// `mid` plus an offset.
    Mid(i64),
}

impl BoundExpr {
    fn eval(&self, len: usize) -> i64 {
        match *self {
            BoundExpr::Literal(v) => v,
            BoundExpr::End(off) => len as i64 + off,
            BoundExpr::Mid(off) => (len / 2) as i64 + off,
        }
    }

    fn shifted(&self, by: i64) -> Self {
        match *self {
            BoundExpr::Literal(v) => BoundExpr::Literal(v + by),
            BoundExpr::End(off) => BoundExpr::End(off + by),
            BoundExpr::Mid(off) => BoundExpr::Mid(off + by),
        }
    }
}

fn parse_offset(entry: &str, rest: &str) -> Result<i64, SlicerError> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Ok(0);
    }
    let mut chars = rest.chars();
    let (sign, digits) = match chars.next() {
        Some('+') => (1, chars.as_str()),
        Some('-') => (-1, chars.as_str()),
        _ => {
            return Err(SlicerError::PreviewParse {
                entry: entry.to_string(),
                reason: format!("unexpected '{}' after keyword", rest),
            })
        }
    };
    let value: i64 = digits.trim().parse().map_err(|_| SlicerError::PreviewParse {
        entry: entry.to_string(),
        reason: format!("'{}' is not an integer offset", digits.trim()),
    })?;
    Ok(sign * value)
}

fn parse_bound(entry: &str, field: &str) -> Result<BoundExpr, SlicerError> {
    let field = field.trim();
    if let Some(rest) = field.strip_prefix("end") {
        return Ok(BoundExpr::End(parse_offset(entry, rest)?));
    }
    if let Some(rest) = field.strip_prefix("mid") {
        return Ok(BoundExpr::Mid(parse_offset(entry, rest)?));
    }
    field
        .parse()
        .map(BoundExpr::Literal)
        .map_err(|_| SlicerError::PreviewParse {
            entry: entry.to_string(),
            reason: format!("'{}' is not an integer, 'end' or 'mid'", field),
        })
}

fn parse_int(entry: &str, field: &str, what: &str) -> Result<i64, SlicerError> {
    field.trim().parse().map_err(|_| SlicerError::PreviewParse {
        entry: entry.to_string(),
        reason: format!("{} '{}' is not an integer", what, field.trim()),
    })
}

/// One dimension of a preview. Missing fields fall back to the defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct PreviewEntry {
    pub start: Option<BoundExpr>,
    pub stop: Option<BoundExpr>,
    pub step: Option<i64>,
    pub chunk: Option<i64>,
}

impl PreviewEntry {
    /// The entry that selects the full dimension.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn new(start: i64, stop: i64, step: i64, chunk: i64) -> Self {
        Self {
            start: Some(BoundExpr::Literal(start)),
            stop: Some(BoundExpr::Literal(stop)),
            step: Some(step),
            chunk: Some(chunk),
        }
    }
}

impl FromStr for PreviewEntry {
    type Err = SlicerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(':').collect();
        if fields.len() > 4 {
            return Err(SlicerError::PreviewParse {
                entry: s.to_string(),
                reason: "expected at most 4 fields 'start:stop:step:chunk'".to_string(),
            });
        }
        let opt = |i: usize| fields.get(i).map(|f| f.trim()).filter(|f| !f.is_empty());

        // A bare value selects exactly one index.
        if fields.len() == 1 {
            return match opt(0) {
                None => Ok(Self::full()),
                Some(f) => {
                    let start = parse_bound(s, f)?;
                    Ok(Self {
                        start: Some(start),
                        stop: Some(start.shifted(1)),
                        step: None,
                        chunk: None,
                    })
                }
            };
        }

        Ok(Self {
            start: opt(0).map(|f| parse_bound(s, f)).transpose()?,
            stop: opt(1).map(|f| parse_bound(s, f)).transpose()?,
            step: opt(2).map(|f| parse_int(s, f, "step")).transpose()?,
            chunk: opt(3).map(|f| parse_int(s, f, "chunk")).transpose()?,
        })
    }
}

impl TryFrom<String> for PreviewEntry {
    type Error = SlicerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = |f: &mut fmt::Formatter<'_>, name: &str, off: i64| match off {
            0 => write!(f, "{}", name),
            o if o > 0 => write!(f, "{}+{}", name, o),
            o => write!(f, "{}{}", name, o),
        };
        match *self {
            BoundExpr::Literal(v) => write!(f, "{}", v),
            BoundExpr::End(off) => keyword(f, "end", off),
            BoundExpr::Mid(off) => keyword(f, "mid", off),
        }
    }
}

impl fmt::Display for PreviewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = |v: Option<String>| v.unwrap_or_default();
        write!(
            f,
            "{}:{}:{}:{}",
            field(self.start.map(|b| b.to_string())),
            field(self.stop.map(|b| b.to_string())),
            field(self.step.map(|v| v.to_string())),
            field(self.chunk.map(|v| v.to_string())),
        )
    }
}

impl From<PreviewEntry> for String {
    fn from(entry: PreviewEntry) -> String {
        entry.to_string()
    }
}

//==================================================================================
// 2. Resolved Window
//==================================================================================

/// A fully resolved, per-dimension `(start, stop, step, chunk)` window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub starts: Vec<i64>,
    pub stops: Vec<i64>,
    pub steps: Vec<i64>,
    pub chunks: Vec<usize>,
}

impl Window {
    /// The window covering every dimension of `shape` in full.
    pub fn full(shape: &[usize]) -> Self {
        Self {
            starts: vec![0; shape.len()],
            stops: shape.iter().map(|&n| n as i64).collect(),
            steps: vec![1; shape.len()],
            chunks: vec![1; shape.len()],
        }
    }

    pub fn ndim(&self) -> usize {
        self.starts.len()
    }

    /// `stop - start` along a dimension.
    pub fn span(&self, dim: usize) -> i64 {
        self.stops[dim] - self.starts[dim]
    }

    /// Number of indices the window iterates along a dimension, chunk windows included.
    pub fn extent(&self, dim: usize) -> usize {
        let span = self.span(dim).max(0);
        let step = self.steps[dim].max(1);
        (((span + step - 1) / step) as usize) * self.chunks[dim]
    }

    /// The previewed shape of the dataset.
    pub fn shape(&self) -> Vec<usize> {
        (0..self.ndim()).map(|d| self.extent(d)).collect()
    }
}

//==================================================================================
// 3. Resolution
//==================================================================================

/// Resolves a preview against a concrete dataset shape.
pub fn resolve(shape: &[usize], preview: &[PreviewEntry]) -> Result<Window, SlicerError> {
    if preview.len() > shape.len() {
        return Err(SlicerError::InvalidConfig(format!(
            "preview has {} entries but the dataset has only {} dimensions",
            preview.len(),
            shape.len()
        )));
    }

    let mut window = Window::full(shape);
    for (dim, &len) in shape.iter().enumerate() {
        let entry = preview.get(dim).copied().unwrap_or_default();
        let start = entry.start.map_or(0, |b| b.eval(len));
        let stop = entry.stop.map_or(len as i64, |b| b.eval(len));
        let step = entry.step.unwrap_or(1);
        let chunk = entry.chunk.unwrap_or(1);

        if step < 1 {
            return Err(SlicerError::dim(dim, format!("step {} must be at least 1", step)));
        }
        if chunk < 1 {
            return Err(SlicerError::dim(dim, format!("chunk {} must be at least 1", chunk)));
        }
        if start < 0 || stop < 0 {
            return Err(SlicerError::dim(
                dim,
                format!("negative window bound (start {}, stop {})", start, stop),
            ));
        }
        if stop > len as i64 {
            return Err(SlicerError::dim(
                dim,
                format!("window stop {} exceeds dimension length {}", stop, len),
            ));
        }
        if start > stop {
            return Err(SlicerError::dim(
                dim,
                format!("window start {} is after stop {}", start, stop),
            ));
        }
        if chunk > 1 && stop - start == 1 && start - chunk / 2 < 0 {
            return Err(SlicerError::dim(
                dim,
                format!(
                    "negative slice index: chunk of {} centred on {} starts before 0",
                    chunk, start
                ),
            ));
        }

        if chunk > 1 && stop > start {
            let last = start + (stop - start - 1) / step * step;
            if last + chunk - chunk / 2 > len as i64 {
                return Err(SlicerError::dim(
                    dim,
                    format!("chunk of {} centred on {} runs past length {}", chunk, last, len),
                ));
            }
        }

        window.starts[dim] = start;
        window.stops[dim] = stop;
        window.steps[dim] = step;
        window.chunks[dim] = chunk as usize;
    }

    log::debug!("resolved preview window {:?} for shape {:?}", window, shape);
    Ok(window)
}

/// Resolves symbolic shape entries through the axis labels, then the preview.
pub fn resolve_with_labels(
    shape: &[ShapeEntry],
    labels: &[AxisLabel],
    preview: &[PreviewEntry],
) -> Result<(Vec<usize>, Window), SlicerError> {
    let shape = resolve_shape(shape, labels)?;
    let window = resolve(&shape, preview)?;
    Ok((shape, window))
}
