//! Dataset shape description.
//!
//! Shape entries are usually literal lengths, but some loaders only know a
//! dimension's length once its axis values are available (e.g. a scan whose
//! number of points is recorded alongside the data). Those entries are
//! symbolic and are resolved through the axis-label table.

use crate::error::SlicerError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single entry of a dataset shape.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ShapeEntry {
    /// A literal dimension length.
    Fixed(usize),
    /// A symbolic length (conventionally `"var"`), resolved via the axis label.
    Symbolic(String),
}

impl From<usize> for ShapeEntry {
    fn from(n: usize) -> Self {
        ShapeEntry::Fixed(n)
    }
}

/// The label attached to one dataset axis, e.g. `rotation_angle.degrees`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AxisLabel {
    pub name: String,
    pub unit: String,
    /// Number of axis values, when known. Required for symbolic shape entries.
    #[serde(default)]
    pub length: Option<usize>,
}

impl AxisLabel {
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }
}

impl FromStr for AxisLabel {
    type Err = SlicerError;

    /// Parses the `name.unit` form used by loaders.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((name, unit)) if !name.is_empty() && !unit.is_empty() => Ok(AxisLabel {
                name: name.to_string(),
                unit: unit.to_string(),
                length: None,
            }),
            _ => Err(SlicerError::InvalidConfig(format!(
                "axis label '{}' is not of the form 'name.unit'",
                s
            ))),
        }
    }
}

/// Substitutes symbolic shape entries with their axis-label lengths.
pub fn resolve_shape(
    entries: &[ShapeEntry],
    labels: &[AxisLabel],
) -> Result<Vec<usize>, SlicerError> {
    entries
        .iter()
        .enumerate()
        .map(|(dim, entry)| match entry {
            ShapeEntry::Fixed(n) => Ok(*n),
            ShapeEntry::Symbolic(_) => labels
                .get(dim)
                .and_then(|label| label.length)
                .ok_or_else(|| {
                    SlicerError::dim(dim, "variable length has no axis-label length to resolve it")
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_entries_use_label_length() {
        let labels = vec![
            "rotation_angle.degrees".parse::<AxisLabel>().unwrap(),
            "scan.number".parse::<AxisLabel>().unwrap().with_length(6),
        ];
        let shape = vec![ShapeEntry::Fixed(91), ShapeEntry::Symbolic("var".into())];
        assert_eq!(resolve_shape(&shape, &labels).unwrap(), vec![91, 6]);
    }

    #[test]
    fn test_symbolic_entry_without_length_fails() {
        let labels = vec!["scan.number".parse::<AxisLabel>().unwrap()];
        let shape = vec![ShapeEntry::Symbolic("var".into())];
        let err = resolve_shape(&shape, &labels).unwrap_err();
        assert!(err.to_string().starts_with("dimension 0:"));
    }

    #[test]
    fn test_shape_entries_deserialize_mixed() {
        let shape: Vec<ShapeEntry> = serde_json::from_str(r#"[10, "var", 4]"#).unwrap();
        assert_eq!(shape[0], ShapeEntry::Fixed(10));
        assert_eq!(shape[1], ShapeEntry::Symbolic("var".into()));
    }

    #[test]
    fn test_bad_axis_label() {
        assert!("detector_x".parse::<AxisLabel>().is_err());
    }
}
