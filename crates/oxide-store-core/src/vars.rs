//! Template variable substitution.
//!
//! Table definitions, named statements, migration scripts and ad-hoc SQL may
//! contain `$name$` tokens. They are replaced verbatim before the SQL reaches
//! the connection.

use std::collections::BTreeMap;

/// Table name token.
pub const TABLE: &str = "$table$";
/// Table name prefix token.
pub const PREFIX: &str = "$prefix$";
/// Table engine clause token (`engine=InnoDB` on MySQL, empty on SQLite).
pub const ENGINE: &str = "$engine$";
/// Auto-increment keyword token.
pub const AUTO_INCREMENT: &str = "$auto_increment$";
/// String-locate function token (`instr` / `locate`).
pub const LOCATE: &str = "$locate$";

/// A set of template variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    values: BTreeMap<String, String>,
}

impl Variables {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(token, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replaces every occurrence of every known token in `template`.
    ///
    /// Resolving a string without tokens returns it unchanged.
    #[must_use]
    pub fn resolve(&self, template: &str) -> String {
        let mut resolved = template.to_string();
        for (name, value) in &self.values {
            if resolved.contains(name.as_str()) {
                resolved = resolved.replace(name.as_str(), value);
            }
        }
        resolved
    }
}

impl<K, V> FromIterator<(K, V)> for Variables
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (k, v) in iter {
            vars.set(k, v);
        }
        vars
    }
}

impl<K, V> Extend<(K, V)> for Variables
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}
