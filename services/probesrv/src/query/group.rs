//! Property groups: grouped rows ordered by index, decodable into typed records

use errors::{ProbeError, Result};
use netprobe_model::Value;
use serde::de::DeserializeOwned;

use super::reader::{Cell, GroupedRows, Row};

/// One row of a group together with its index
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyGroup {
    pub index: u64,
    pub fields: Row,
}

impl PropertyGroup {
    pub fn get(&self, label: &str) -> Option<&Cell> {
        self.fields.get(label)
    }

    /// Decode into a typed record
    ///
    /// Unknown labels are ignored. A label whose value has the wrong type fails
    /// the decode; strings are never coerced into numbers. NaN and infinite
    /// floats are rejected.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        reject_non_finite(&self.fields, "").map_err(|label| {
            ProbeError::decode(format!(
                "row {} couldn't be decoded: '{}' is not a finite number",
                self.index, label
            ))
        })?;
        let json = serde_json::to_value(&self.fields)?;
        serde_json::from_value(json).map_err(|e| {
            ProbeError::decode(format!("row {} couldn't be decoded: {}", self.index, e))
        })
    }
}

/// Dotted label of the first non-finite float in `row`
fn reject_non_finite(row: &Row, prefix: &str) -> std::result::Result<(), String> {
    for (label, cell) in row {
        let path = if prefix.is_empty() {
            label.clone()
        } else {
            format!("{}.{}", prefix, label)
        };
        match cell {
            Cell::Scalar(Value::Float(v)) if !v.is_finite() => return Err(path),
            Cell::Row(nested) => reject_non_finite(nested, &path)?,
            Cell::Scalar(_) => {},
        }
    }
    Ok(())
}

/// Rows sorted by ascending index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyGroups(Vec<PropertyGroup>);

impl PropertyGroups {
    pub fn iter(&self) -> std::slice::Iter<'_, PropertyGroup> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> Vec<u64> {
        self.0.iter().map(|g| g.index).collect()
    }

    /// Decode every row, keeping index order
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.0.iter().map(PropertyGroup::decode).collect()
    }
}

impl From<GroupedRows> for PropertyGroups {
    fn from(grouped: GroupedRows) -> Self {
        let mut groups: Vec<PropertyGroup> = grouped
            .into_iter()
            .map(|(index, fields)| PropertyGroup { index, fields })
            .collect();
        groups.sort_unstable_by_key(|g| g.index);
        Self(groups)
    }
}

impl IntoIterator for PropertyGroups {
    type Item = PropertyGroup;
    type IntoIter = std::vec::IntoIter<PropertyGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
