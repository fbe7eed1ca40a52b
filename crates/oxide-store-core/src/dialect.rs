//! SQL dialect support.
//!
//! The two supported engines disagree on a handful of things this crate cares
//! about: DDL tokens (auto-increment keyword, table engine clause), the
//! string-locate function, identifier quoting, string literal escaping and the
//! spelling of JSON extraction.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::vars;

/// The SQL engine a [`Store`](crate::Store) talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite 3 with the JSON1 functions.
    Sqlite,
    /// MySQL or a wire-compatible engine (MariaDB, TiDB, ...).
    MySql,
}

impl Dialect {
    /// Returns the name of the dialect.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite3",
            Self::MySql => "mysql",
        }
    }

    /// Returns the identifier quote character.
    #[must_use]
    pub const fn identifier_quote(self) -> char {
        match self {
            Self::Sqlite => '"',
            Self::MySql => '`',
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    #[must_use]
    pub fn quote_identifier(self, name: &str) -> String {
        let quote = self.identifier_quote();
        let doubled: String = [quote, quote].iter().collect();
        let escaped = name.replace(quote, &doubled);
        format!("{quote}{escaped}{quote}")
    }

    /// Escapes the body of a single-quoted string literal.
    ///
    /// MySQL interprets backslash escapes, so backslash, single quote, NUL,
    /// newline, carriage return, double quote and Ctrl-Z are escaped with a
    /// backslash. SQLite treats backslashes literally; only the single quote
    /// needs doubling.
    #[must_use]
    pub fn escape_string(self, value: &str) -> String {
        match self {
            Self::Sqlite => value.replace('\'', "''"),
            Self::MySql => {
                let mut out = String::with_capacity(value.len() + 2);
                for c in value.chars() {
                    match c {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '\0' => out.push_str("\\0"),
                        '\n' => out.push_str("\\n"),
                        '\r' => out.push_str("\\r"),
                        '"' => out.push_str("\\\""),
                        '\x1a' => out.push_str("\\Z"),
                        other => out.push(other),
                    }
                }
                out
            }
        }
    }

    /// Returns an escaped, single-quoted string literal.
    #[must_use]
    pub fn quote_string(self, value: &str) -> String {
        format!("'{}'", self.escape_string(value))
    }

    /// Returns the SQL extracting the JSON value at `path` from `column` as text.
    ///
    /// `path` must already be a quoted literal.
    #[must_use]
    pub fn json_extract(self, column: &str, quoted_path: &str) -> String {
        match self {
            Self::Sqlite => format!("json_extract({column},{quoted_path})"),
            Self::MySql => format!("json_unquote(json_extract({column},{quoted_path}))"),
        }
    }

    /// Returns the SQL testing whether `column` holds a value at `path`.
    #[must_use]
    pub fn json_contains_path(self, column: &str, quoted_path: &str) -> String {
        match self {
            Self::Sqlite => format!("json_type({column},{quoted_path}) is not null"),
            Self::MySql => format!("json_contains_path({column},'one',{quoted_path})"),
        }
    }

    /// Wraps an expression in a numeric cast.
    #[must_use]
    pub fn numeric_cast(self, sql: &str) -> String {
        match self {
            Self::Sqlite => format!("cast({sql} as real)"),
            Self::MySql => format!("cast({sql} as decimal(65,30))"),
        }
    }

    /// Returns the SQL concatenating `parts`.
    #[must_use]
    pub fn concat(self, parts: &[&str]) -> String {
        match self {
            Self::Sqlite => parts.join(" || "),
            Self::MySql => format!("concat({})", parts.join(", ")),
        }
    }

    /// Returns the string-locate function (`$locate$`).
    #[must_use]
    pub const fn locate_function(self) -> &'static str {
        match self {
            Self::Sqlite => "instr",
            Self::MySql => "locate",
        }
    }

    /// Returns the auto-increment keyword (`$auto_increment$`).
    #[must_use]
    pub const fn auto_increment_keyword(self) -> &'static str {
        match self {
            Self::Sqlite => "AUTOINCREMENT",
            Self::MySql => "AUTO_INCREMENT",
        }
    }

    /// Returns the table engine clause (`$engine$`).
    #[must_use]
    pub const fn engine_clause(self) -> &'static str {
        match self {
            Self::Sqlite => "",
            Self::MySql => "engine=InnoDB",
        }
    }

    /// Returns the template variables every store of this dialect starts with.
    #[must_use]
    pub const fn default_variables(self) -> [(&'static str, &'static str); 3] {
        [
            (vars::LOCATE, self.locate_function()),
            (vars::AUTO_INCREMENT, self.auto_increment_keyword()),
            (vars::ENGINE, self.engine_clause()),
        ]
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::MySql),
            _ => Err(Error::DialectNotSupported(s.to_string())),
        }
    }
}
