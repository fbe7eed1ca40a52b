//! Row scanners.
//!
//! A scanner turns one row into one typed value. Scanners are registered by
//! name in a per-store [`ScannerRegistry`]; lookups check the requested
//! result type so a caller asking for `i64` from a string scanner gets
//! [`Error::ScannerTypeMismatch`] instead of a bad cast.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::entry::{DoubleMapEntry, ListEntry, MapEntry, PairListEntry, SqlIndex};
use crate::error::{Error, Result};
use crate::row::Row;

/// Names of the built-in scanners.
pub mod names {
    /// `i64` from the first column.
    pub const INT: &str = "int";
    /// `f64` from the first column.
    pub const FLOAT: &str = "float";
    /// `bool` from a 0/1 integer in the first column.
    pub const BOOL: &str = "bool";
    /// `String` from the first column.
    pub const STRING: &str = "string";
    /// `serde_json::Value` parsed from the first column.
    pub const JSON: &str = "json";
    /// [`ListEntry`](crate::ListEntry) from `(index, value)`.
    pub const LIST_ENTRY: &str = "list_entry";
    /// [`MapEntry`](crate::MapEntry) from `(key, value)`.
    pub const MAP_ENTRY: &str = "map_entry";
    /// [`DoubleMapEntry`](crate::DoubleMapEntry) from `(first_key, second_key, value)`.
    pub const DOUBLE_MAP_ENTRY: &str = "double_map_entry";
    /// [`PairListEntry`](crate::PairListEntry) from `(index, key, value)`.
    pub const PAIR_LIST_ENTRY: &str = "pair_list_entry";
    /// [`SqlIndex`](crate::SqlIndex) from a `PRAGMA index_list` row.
    pub const SQLITE_INDEX: &str = "sqlite_index";
    /// [`SqlIndex`](crate::SqlIndex) from a `SHOW INDEX` row.
    pub const MYSQL_INDEX: &str = "mysql_index";
}

/// Maps one row to one value.
pub trait Scanner<T>: Send + Sync {
    /// Scans `row`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error when the row does not have the expected shape.
    fn scan(&self, row: &Row) -> Result<T>;
}

impl<T, F> Scanner<T> for F
where
    F: Fn(&Row) -> Result<T> + Send + Sync,
{
    fn scan(&self, row: &Row) -> Result<T> {
        self(row)
    }
}

/// A scanner shared between the registry and open cursors.
pub type SharedScanner<T> = Arc<dyn Scanner<T>>;

#[derive(Clone)]
struct Registered {
    produces: &'static str,
    scanner: Arc<dyn Any + Send + Sync>,
}

/// Scanners keyed by name.
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    scanners: HashMap<String, Registered>,
}

impl ScannerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in value and entry scanners.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register_fn(names::INT, scan_int)
            .register_fn(names::FLOAT, scan_float)
            .register_fn(names::BOOL, scan_bool)
            .register_fn(names::STRING, scan_string)
            .register_fn(names::JSON, scan_json)
            .register_fn(names::LIST_ENTRY, scan_list_entry)
            .register_fn(names::MAP_ENTRY, scan_map_entry)
            .register_fn(names::DOUBLE_MAP_ENTRY, scan_double_map_entry)
            .register_fn(names::PAIR_LIST_ENTRY, scan_pair_list_entry);
        registry
    }

    /// Registers `scanner` under `name`, replacing any previous scanner.
    pub fn register<T, S>(&mut self, name: impl Into<String>, scanner: S) -> &mut Self
    where
        T: 'static,
        S: Scanner<T> + 'static,
    {
        let shared: SharedScanner<T> = Arc::new(scanner);
        let erased: Arc<dyn Any + Send + Sync> = Arc::new(shared);
        self.scanners.insert(
            name.into(),
            Registered {
                produces: type_name::<T>(),
                scanner: erased,
            },
        );
        self
    }

    /// Registers a scanner function under `name`.
    pub fn register_fn<T, F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&Row) -> Result<T> + Send + Sync + 'static,
    {
        self.register::<T, F>(name, f)
    }

    /// Returns `true` if a scanner is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.scanners.contains_key(name)
    }

    /// Looks up the scanner registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScannerNotFound`] for unknown names and
    /// [`Error::ScannerTypeMismatch`] when the scanner produces another type.
    pub fn get<T: 'static>(&self, name: &str) -> Result<SharedScanner<T>> {
        let registered = self
            .scanners
            .get(name)
            .ok_or_else(|| Error::ScannerNotFound(name.to_string()))?;
        registered
            .scanner
            .downcast_ref::<SharedScanner<T>>()
            .cloned()
            .ok_or_else(|| Error::ScannerTypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }
}

impl fmt::Debug for ScannerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(&str, &str)> = self
            .scanners
            .iter()
            .map(|(name, r)| (name.as_str(), r.produces))
            .collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}

fn scan_int(row: &Row) -> Result<i64> {
    row.get(0)
}

fn scan_float(row: &Row) -> Result<f64> {
    row.get(0)
}

fn scan_bool(row: &Row) -> Result<bool> {
    row.get(0)
}

fn scan_string(row: &Row) -> Result<String> {
    row.get(0)
}

fn scan_json(row: &Row) -> Result<serde_json::Value> {
    row.get(0)
}

fn scan_list_entry(row: &Row) -> Result<ListEntry> {
    Ok(ListEntry {
        index: row.get(0)?,
        value: row.get(1)?,
    })
}

fn scan_map_entry(row: &Row) -> Result<MapEntry> {
    Ok(MapEntry {
        key: row.get(0)?,
        value: row.get(1)?,
    })
}

fn scan_double_map_entry(row: &Row) -> Result<DoubleMapEntry> {
    Ok(DoubleMapEntry {
        first_key: row.get(0)?,
        second_key: row.get(1)?,
        value: row.get(2)?,
    })
}

fn scan_pair_list_entry(row: &Row) -> Result<PairListEntry> {
    Ok(PairListEntry {
        index: row.get(0)?,
        key: row.get(1)?,
        value: row.get(2)?,
    })
}

/// Scans a `PRAGMA index_list('<table>')` row.
pub(crate) fn scan_sqlite_index(row: &Row) -> Result<SqlIndex> {
    let name = row
        .get_by_name::<Option<String>>("name")?
        .ok_or_else(|| Error::IndexNotFound(String::from("unnamed index")))?;
    Ok(SqlIndex {
        name,
        ..SqlIndex::default()
    })
}

/// Scans a `SHOW INDEX FROM <table>` row.
pub(crate) fn scan_mysql_index(row: &Row) -> Result<SqlIndex> {
    let name: String = row.get_by_name("Key_name")?;
    if name.is_empty() {
        return Err(Error::IndexNotFound(name));
    }
    let table: String = row.get_by_name("Table")?;
    if table.is_empty() {
        return Err(Error::TableNotFound(table));
    }
    let fields = row
        .get_by_name::<Option<String>>("Column_name")?
        .into_iter()
        .collect();
    Ok(SqlIndex {
        name,
        table,
        fields,
    })
}
