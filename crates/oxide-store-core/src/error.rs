//! Error types for the data-access layer.

use std::fmt;

/// Boxed driver error carried by [`Error::Driver`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The constraint a write violated.
///
/// Drivers translate their own error codes into this enum so callers can
/// branch on a constraint violation without knowing either dialect's error
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// Primary key conflict.
    PrimaryKey,
    /// Unique index conflict.
    Unique,
    /// Missing parent row or row still referenced.
    ForeignKey,
    /// NULL written to a NOT NULL column.
    NotNull,
    /// CHECK constraint failed.
    Check,
    /// Any other constraint failure reported by the engine.
    Other,
}

impl ConstraintKind {
    /// Maps a MySQL server error number to a constraint kind.
    ///
    /// Returns `None` when the number is not a constraint error.
    #[must_use]
    pub const fn from_mysql_code(code: u16) -> Option<Self> {
        match code {
            // ER_DUP_ENTRY covers both primary keys and unique indexes.
            1062 | 1586 => Some(Self::Unique),
            1451 | 1452 | 1216 | 1217 => Some(Self::ForeignKey),
            1048 | 1364 => Some(Self::NotNull),
            3819 => Some(Self::Check),
            _ => None,
        }
    }

    /// Returns `true` for primary key and unique conflicts.
    #[must_use]
    pub const fn is_duplicate(self) -> bool {
        matches!(self, Self::PrimaryKey | Self::Unique)
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PrimaryKey => "primary key",
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::NotNull => "not null",
            Self::Check => "check",
            Self::Other => "constraint",
        };
        f.write_str(name)
    }
}

/// Errors returned by the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A table the operation depends on does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// An index the operation depends on does not exist.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// The operation requires `Store::init` to have completed.
    #[error("store is not initialized")]
    Init,

    /// The dialect name is outside the supported set.
    #[error("unsupported dialect: {0}")]
    DialectNotSupported(String),

    /// No compiled statement is registered under this name.
    #[error("statement not found: {0}")]
    StatementNotFound(String),

    /// No scanner is registered under this name.
    #[error("scanner not found: {0}")]
    ScannerNotFound(String),

    /// The scanner exists but produces a different type.
    #[error("scanner '{name}' does not produce {expected}")]
    ScannerTypeMismatch {
        /// Scanner name.
        name: String,
        /// Requested result type.
        expected: &'static str,
    },

    /// A "first" query returned no rows, or a cursor has no current row.
    #[error("entry not found")]
    EntryNotFound,

    /// The transaction was already committed or rolled back.
    #[error("transaction not found")]
    TransactionNotFound,

    /// Another connection held a lock the statement needed.
    #[error("database busy: {0}")]
    Busy(String),

    /// A write violated a table constraint.
    #[error("{kind} constraint violated: {message}")]
    Constraint {
        /// Which constraint failed.
        kind: ConstraintKind,
        /// Engine message.
        message: String,
    },

    /// A column value could not be converted to the requested type.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// JSON decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A commit or rollback hook failed. Hooks that already ran are not undone.
    #[error("hook {} of {} failed: {source}", .completed + 1, .completed + 1 + .remaining)]
    Hooks {
        /// Number of hooks that ran successfully before the failure.
        completed: usize,
        /// Number of hooks skipped after the failure.
        remaining: usize,
        /// The failing hook's error.
        #[source]
        source: Box<Error>,
    },

    /// Error reported by the underlying driver.
    #[error("driver error: {0}")]
    Driver(#[source] BoxError),
}

impl Error {
    /// Wraps a driver error.
    pub fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }

    /// Returns `true` for the recoverable not-found family.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EntryNotFound
                | Self::TableNotFound(_)
                | Self::IndexNotFound(_)
                | Self::StatementNotFound(_)
                | Self::ScannerNotFound(_)
                | Self::TransactionNotFound
        )
    }

    /// Returns the violated constraint, if this is a constraint error.
    #[must_use]
    pub const fn constraint(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_codes() {
        assert_eq!(ConstraintKind::from_mysql_code(1062), Some(ConstraintKind::Unique));
        assert_eq!(
            ConstraintKind::from_mysql_code(1452),
            Some(ConstraintKind::ForeignKey)
        );
        assert_eq!(ConstraintKind::from_mysql_code(1048), Some(ConstraintKind::NotNull));
        assert_eq!(ConstraintKind::from_mysql_code(1146), None);
    }

    #[test]
    fn test_not_found_family() {
        assert!(Error::EntryNotFound.is_not_found());
        assert!(Error::StatementNotFound("get".into()).is_not_found());
        assert!(!Error::Init.is_not_found());
        assert!(!Error::DialectNotSupported("pg".into()).is_not_found());
        assert!(!Error::Busy("database is locked".into()).is_not_found());
    }

    #[test]
    fn test_hooks_message() {
        let err = Error::Hooks {
            completed: 1,
            remaining: 2,
            source: Box::new(Error::TransactionNotFound),
        };
        assert_eq!(err.to_string(), "hook 2 of 4 failed: transaction not found");
    }

    #[test]
    fn test_constraint_accessor() {
        let err = Error::Constraint {
            kind: ConstraintKind::PrimaryKey,
            message: "UNIQUE constraint failed: kv.name".into(),
        };
        assert_eq!(err.constraint(), Some(ConstraintKind::PrimaryKey));
        assert!(err.constraint().is_some_and(ConstraintKind::is_duplicate));
        assert!(Error::Init.constraint().is_none());
    }
}
