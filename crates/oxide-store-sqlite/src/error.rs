//! Translation of rusqlite errors into store errors.

use rusqlite::{ffi, ErrorCode};

use oxide_store_core::{ConstraintKind, Error};

const NO_SUCH_TABLE: &str = "no such table: ";

/// Normalizes a rusqlite error.
///
/// Constraint violations become [`Error::Constraint`], lock conflicts
/// become [`Error::Busy`], a missing table becomes [`Error::TableNotFound`],
/// and everything else is wrapped as a driver error.
#[must_use]
pub fn into_store_error(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return Error::Constraint {
                kind: constraint_kind(failure.extended_code),
                message: message.clone().unwrap_or_else(|| failure.to_string()),
            };
        }
        if matches!(
            failure.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        ) {
            return Error::Busy(message.clone().unwrap_or_else(|| failure.to_string()));
        }
        if let Some(table) = message.as_deref().and_then(|m| m.strip_prefix(NO_SUCH_TABLE)) {
            return Error::TableNotFound(table.to_string());
        }
    }
    if matches!(err, rusqlite::Error::QueryReturnedNoRows) {
        return Error::EntryNotFound;
    }
    Error::driver(err)
}

const fn constraint_kind(extended_code: std::os::raw::c_int) -> ConstraintKind {
    match extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
        ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
        _ => ConstraintKind::Other,
    }
}
