//! Value expressions.

use crate::dialect::Dialect;
use crate::value::SqlValue;

/// A value expression spliced into a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// String literal, escaped for the dialect when inlined.
    String(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// SQL text passed through untouched.
    Raw(String),
    /// `json_object(...)` over the given arguments.
    JsonObject(Vec<Expression>),
    /// Column reference, quoted with the dialect identifier quote.
    Field(String),
}

impl Expression {
    /// Creates a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates an integer literal.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Int(value)
    }

    /// Creates a float literal.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Float(value)
    }

    /// Creates a raw SQL passthrough.
    ///
    /// **Warning**: the text is not escaped.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Creates a `json_object(...)` constructor.
    #[must_use]
    pub fn json_object(args: impl IntoIterator<Item = Self>) -> Self {
        Self::JsonObject(args.into_iter().collect())
    }

    /// Creates a column reference.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Renders the expression for `dialect`.
    #[must_use]
    pub fn eval(&self, dialect: Dialect) -> String {
        match self {
            Self::Raw(sql) => sql.clone(),
            Self::Field(name) => dialect.quote_identifier(name),
            Self::JsonObject(args) => {
                let args: Vec<String> = args.iter().map(|a| a.eval(dialect)).collect();
                format!("json_object({})", args.join(","))
            }
            literal => literal
                .literal()
                .map_or_else(String::new, |v| v.to_sql_inline(dialect)),
        }
    }

    /// Returns the bindable value for literal expressions.
    ///
    /// NaN and infinite floats become [`SqlValue::Null`].
    #[must_use]
    pub fn literal(&self) -> Option<SqlValue> {
        match self {
            Self::String(s) => Some(SqlValue::Text(s.clone())),
            Self::Int(n) => Some(SqlValue::Int(*n)),
            Self::Float(f) if f.is_finite() => Some(SqlValue::Float(*f)),
            Self::Float(_) => Some(SqlValue::Null),
            Self::Raw(_) | Self::JsonObject(_) | Self::Field(_) => None,
        }
    }

    /// Returns the unquoted text of a literal, used to build LIKE patterns.
    pub(crate) fn literal_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Raw(_) | Self::JsonObject(_) | Self::Field(_) => None,
        }
    }

    /// Returns `true` for integer and float literals.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}
