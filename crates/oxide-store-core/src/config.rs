//! Store configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::Result;

/// Settings applied when a [`Store`](crate::Store) is built from configuration.
///
/// ```rust
/// use oxide_store_core::StoreConfig;
///
/// let config: StoreConfig = serde_json::from_str(
///     r#"{"dialect": "sqlite3", "table_prefix": "app_", "variables": {"$owner$": "ops"}}"#,
/// )
/// .unwrap();
/// assert_eq!(config.table_prefix.as_deref(), Some("app_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Dialect name: `sqlite3`, `sqlite` or `mysql`.
    pub dialect: String,
    /// Value of `$prefix$`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_prefix: Option<String>,
    /// Value of `$table$`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Extra template variables, keyed by token.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
}

impl StoreConfig {
    /// Creates a configuration for `dialect` with no variables.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect: dialect.name().to_string(),
            table_prefix: None,
            table_name: None,
            variables: BTreeMap::new(),
        }
    }

    /// Parses the configured dialect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DialectNotSupported`](crate::Error::DialectNotSupported)
    /// for names outside the supported set.
    pub fn dialect(&self) -> Result<Dialect> {
        self.dialect.parse()
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    /// Sets the table name.
    #[must_use]
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = Some(name.into());
        self
    }

    /// Adds a template variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }
}
