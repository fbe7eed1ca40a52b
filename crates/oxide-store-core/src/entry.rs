//! Row shapes shared by the collection tables.

use serde::{Deserialize, Serialize};

/// A list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub index: i64,
    pub value: String,
}

/// A map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: String,
    pub value: String,
}

/// A double map entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleMapEntry {
    pub first_key: String,
    pub second_key: String,
    pub value: String,
}

/// A pair list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairListEntry {
    pub index: i64,
    pub key: String,
    pub value: String,
}

/// A table index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlIndex {
    /// Index name.
    pub name: String,
    /// Indexed table. May contain template variables.
    pub table: String,
    /// Indexed columns.
    pub fields: Vec<String>,
}

impl SqlIndex {
    /// Creates an index description.
    #[must_use]
    pub fn new(name: impl Into<String>, table: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}
