//! # oxide-store-sqlite
//!
//! SQLite driver for `oxide-store-core`, built on [`rusqlite`].
//!
//! # How SQLite differs from MySQL here
//!
//! - **[Type affinity]**: any column can hold any value, so JSON is stored
//!   as `text` and extracted with [`json_extract`].
//! - **No boolean type**: booleans are written as `0`/`1` integers.
//! - **One writer**: each transaction runs on its own connection to the same
//!   database. Autocommit reads do not see its uncommitted rows, and an
//!   autocommit write waits for its lock, then fails with
//!   [`Error::Busy`]. File databases use WAL so readers never wait.
//! - **One statement per call**: stacked statements such as
//!   `insert ...; delete ...` are rejected before any of them runs.
//! - **Constraint codes**: violations are mapped from the
//!   [extended result codes] to [`ConstraintKind`].
//!
//! # Example
//!
//! ```rust
//! use oxide_store_core::{names, params};
//! use oxide_store_sqlite::open_store_in_memory;
//!
//! let store = open_store_in_memory()?;
//! store
//!     .set_table_name("kv")
//!     .add_table_definition("create table if not exists $table$ (name varchar(255) primary key, value text)")
//!     .add_statement("save", "insert into $table$ values (?, ?)")
//!     .add_statement("get", "select value from $table$ where name=?");
//! store.init()?;
//!
//! store.exec("save", &params!["a", "1"])?;
//! let value: String = store.query_first("get", names::STRING, &params!["a"])?;
//! assert_eq!(value, "1");
//! # Ok::<(), oxide_store_core::Error>(())
//! ```
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [`json_extract`]: https://www.sqlite.org/json1.html#jex
//! [extended result codes]: https://www.sqlite.org/rescode.html#extrc
//! [`ConstraintKind`]: oxide_store_core::ConstraintKind
//! [`Error::Busy`]: oxide_store_core::Error::Busy

mod connection;
mod error;
mod value;

use std::path::Path;
use std::sync::Arc;

use oxide_store_core::{Connection, Dialect, Result, Store};

pub use connection::SqliteConnection;
pub use error::into_store_error;

/// Opens (or creates) the database file at `path` and wraps it in a store.
///
/// # Errors
///
/// Returns the driver error when the file cannot be opened.
pub fn open_store(path: impl AsRef<Path>) -> Result<Store> {
    let conn = SqliteConnection::open(path)?;
    Ok(Store::new(Arc::new(conn) as Arc<dyn Connection>, Dialect::Sqlite))
}

/// Opens a private in-memory database and wraps it in a store.
///
/// # Errors
///
/// Returns the driver error when SQLite cannot allocate the database.
pub fn open_store_in_memory() -> Result<Store> {
    let conn = SqliteConnection::open_in_memory()?;
    Ok(Store::new(Arc::new(conn) as Arc<dyn Connection>, Dialect::Sqlite))
}
