//! Result rows and the result-set seam drivers implement.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{FromSqlValue, SqlValue};

/// One row of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row. `columns` is shared by every row of a result set.
    #[must_use]
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw column values.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the position of the column named `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the raw value at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the index is out of range.
    pub fn value(&self, index: usize) -> Result<&SqlValue> {
        self.values.get(index).ok_or_else(|| {
            Error::Conversion(format!(
                "column index {index} out of range ({} columns)",
                self.values.len()
            ))
        })
    }

    /// Reads the column at `index` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if the index is out of range or the
    /// value cannot be converted.
    pub fn get<T: FromSqlValue>(&self, index: usize) -> Result<T> {
        T::from_sql_value(self.value(index)?)
    }

    /// Reads the column named `name` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] if there is no such column or the value
    /// cannot be converted.
    pub fn get_by_name<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::Conversion(format!("no column named '{name}'")))?;
        self.get(index)
    }
}

/// A live result set, as handed out by a driver.
///
/// Forward-only: `advance` moves to the next row and `current` exposes it
/// until the next call.
pub trait Rows: Send {
    /// Moves to the next row. Returns `false` once the set is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the driver error if fetching the next row fails.
    fn advance(&mut self) -> Result<bool>;

    /// Returns the row the last successful `advance` moved to.
    fn current(&self) -> Option<&Row>;

    /// Releases the result set.
    ///
    /// # Errors
    ///
    /// Returns the driver error if the result set cannot be released.
    fn close(&mut self) -> Result<()>;
}

/// A result set materialized in memory.
#[derive(Debug)]
pub struct VecRows {
    remaining: std::vec::IntoIter<Row>,
    current: Option<Row>,
}

impl VecRows {
    /// Creates a result set over `rows`.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            remaining: rows.into_iter(),
            current: None,
        }
    }

    /// Creates a result set from column names and value tuples.
    #[must_use]
    pub fn from_values(columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        let columns: Arc<[String]> = columns.iter().map(|c| (*c).to_string()).collect();
        Self::new(
            rows.into_iter()
                .map(|values| Row::new(Arc::clone(&columns), values))
                .collect(),
        )
    }
}

impl Rows for VecRows {
    fn advance(&mut self) -> Result<bool> {
        self.current = self.remaining.next();
        Ok(self.current.is_some())
    }

    fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.remaining = Vec::new().into_iter();
        Ok(())
    }
}
