//! SQL fragment builder.
//!
//! Predicates render through a [`FragmentWriter`] that decides, per literal,
//! whether to splice escaped text or emit a `?` placeholder and collect the
//! value. JSON paths and raw expressions are always spliced.

use crate::dialect::Dialect;
use crate::value::SqlValue;

use super::expression::Expression;

/// How literal values reach the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// Literals are escaped and written into the SQL.
    #[default]
    Inline,
    /// Literals become `?` placeholders; values are returned alongside.
    Parameters,
}

/// A rendered SQL fragment with its bound parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    /// SQL text.
    pub sql: String,
    /// Values for the `?` placeholders, in order.
    pub params: Vec<SqlValue>,
}

impl Fragment {
    /// Splits the fragment into SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

/// Where to put the `%` wildcards of a LIKE pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wildcards {
    /// `%x%`
    Both,
    /// `x%`
    Trailing,
    /// `%x`
    Leading,
}

impl Wildcards {
    const fn prefix(self) -> bool {
        matches!(self, Self::Both | Self::Leading)
    }

    const fn suffix(self) -> bool {
        matches!(self, Self::Both | Self::Trailing)
    }
}

pub(crate) struct FragmentWriter {
    dialect: Dialect,
    binding: Binding,
    sql: String,
    params: Vec<SqlValue>,
}

impl FragmentWriter {
    pub(crate) const fn new(dialect: Dialect, binding: Binding) -> Self {
        Self {
            dialect,
            binding,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    pub(crate) const fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn push_str(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub(crate) fn push_value(&mut self, value: SqlValue) {
        match self.binding {
            Binding::Inline => {
                let inline = value.to_sql_inline(self.dialect);
                self.sql.push_str(&inline);
            }
            Binding::Parameters => {
                self.sql.push('?');
                self.params.push(value);
            }
        }
    }

    pub(crate) fn push_expression(&mut self, expr: &Expression) {
        match expr.literal() {
            Some(value) => self.push_value(value),
            None => {
                let sql = expr.eval(self.dialect);
                self.sql.push_str(&sql);
            }
        }
    }

    /// Writes a LIKE pattern around `expr`.
    ///
    /// Literals become a single text pattern. Other expressions are
    /// concatenated with the wildcards in SQL.
    pub(crate) fn push_pattern(&mut self, expr: &Expression, wildcards: Wildcards) {
        if let Some(text) = expr.literal_text() {
            let mut pattern = String::with_capacity(text.len() + 2);
            if wildcards.prefix() {
                pattern.push('%');
            }
            pattern.push_str(&text);
            if wildcards.suffix() {
                pattern.push('%');
            }
            self.push_value(SqlValue::Text(pattern));
            return;
        }
        let inner = expr.eval(self.dialect);
        let mut parts = Vec::with_capacity(3);
        if wildcards.prefix() {
            parts.push("'%'");
        }
        parts.push(inner.as_str());
        if wildcards.suffix() {
            parts.push("'%'");
        }
        let concat = self.dialect.concat(&parts);
        self.sql.push_str(&concat);
    }

    pub(crate) fn finish(self) -> Fragment {
        Fragment {
            sql: self.sql,
            params: self.params,
        }
    }
}
