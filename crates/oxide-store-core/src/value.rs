//! SQL values used as statement parameters and row columns.

use crate::dialect::Dialect;
use crate::error::{Error, Result};

/// A SQL value that can be bound as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use, escaped for `dialect`.
    ///
    /// NaN and infinities have no SQL literal and render as `NULL`.
    ///
    /// **Warning**: Prefer binding parameters instead.
    #[must_use]
    pub fn to_sql_inline(&self, dialect: Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if f.is_finite() => format!("{f}"),
            Self::Float(_) => String::from("NULL"),
            Self::Text(s) => dialect.quote_string(s),
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        }
    }

    /// Returns the variant name, used in conversion errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for &SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self.clone()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql_value {
    ($($t:ty),*) => {
        $(
            impl ToSqlValue for $t {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql_value!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for &serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

/// Trait for types that can be read from a column value.
pub trait FromSqlValue: Sized {
    /// Converts a column value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when the value has an incompatible type.
    fn from_sql_value(value: &SqlValue) -> Result<Self>;
}

fn mismatch<T>(value: &SqlValue, target: &str) -> Result<T> {
    Err(Error::Conversion(format!(
        "cannot convert {} to {target}",
        value.type_name()
    )))
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Int(v) => Ok(*v),
            SqlValue::Bool(b) => Ok(Self::from(*b)),
            SqlValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| Error::Conversion(format!("cannot parse '{text}' as integer"))),
            other => mismatch(other, "integer"),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| Error::Conversion(format!("{wide} overflows i32")))
    }
}

impl FromSqlValue for u64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        let wide = i64::from_sql_value(value)?;
        Self::try_from(wide).map_err(|_| Error::Conversion(format!("{wide} is negative")))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(v) => Ok(*v),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(v) => Ok(*v as Self),
            SqlValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| Error::Conversion(format!("cannot parse '{text}' as float"))),
            other => mismatch(other, "float"),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(v) => Ok(*v != 0),
            SqlValue::Text(text) => match text.trim() {
                "1" | "true" | "TRUE" => Ok(true),
                "0" | "false" | "FALSE" => Ok(false),
                _ => mismatch(value, "bool"),
            },
            other => mismatch(other, "bool"),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(text) => Ok(text.clone()),
            SqlValue::Int(v) => Ok(v.to_string()),
            SqlValue::Float(v) => Ok(v.to_string()),
            SqlValue::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            SqlValue::Blob(bytes) => Self::from_utf8(bytes.clone())
                .map_err(|_| Error::Conversion("blob is not valid UTF-8".to_string())),
            SqlValue::Null => mismatch(value, "string"),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Blob(bytes) => Ok(bytes.clone()),
            SqlValue::Text(text) => Ok(text.as_bytes().to_vec()),
            other => mismatch(other, "blob"),
        }
    }
}

impl FromSqlValue for serde_json::Value {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(text) => Ok(serde_json::from_str(text)?),
            SqlValue::Blob(bytes) => Ok(serde_json::from_slice(bytes)?),
            SqlValue::Int(v) => Ok(Self::from(*v)),
            SqlValue::Float(v) => Ok(Self::from(*v)),
            SqlValue::Bool(b) => Ok(Self::from(*b)),
            SqlValue::Null => Ok(Self::Null),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

/// Builds a `Vec<SqlValue>` parameter list.
///
/// ```rust
/// use oxide_store_core::{params, SqlValue};
///
/// let params = params!["a", 1_i64, true];
/// assert_eq!(params[1], SqlValue::Int(1));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::SqlValue>::new()
    };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::ToSqlValue::to_sql_value($value)),+]
    };
}
