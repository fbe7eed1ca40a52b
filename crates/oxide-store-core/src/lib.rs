//! # oxide-store-core
//!
//! A dialect-agnostic data-access layer for SQLite and MySQL-compatible
//! engines.
//!
//! This crate provides:
//! - Template variables (`$table$`, `$prefix$`, `$engine$`, ...) resolved in
//!   DDL, statements and migration scripts
//! - A per-store statement registry compiled once by [`Store::init`]
//! - A predicate AST rendering dialect-correct WHERE fragments, inline or
//!   with bound parameters
//! - Typed scanners and single-pass cursors
//! - Transactions with explicit reuse across stores ([`UnitOfWork`])
//!
//! Drivers plug in through the [`Connection`] trait. All calls block.
//!
//! ## Registering statements
//!
//! ```rust,ignore
//! use oxide_store_core::{names, params, Dialect, Store};
//!
//! let store = Store::new(conn, Dialect::Sqlite);
//! store
//!     .set_table_name("kv")
//!     .add_table_definition("create table if not exists $table$ (name varchar(255) primary key, value text)")
//!     .add_statement("save", "insert into $table$ values (?, ?)")
//!     .add_statement("get", "select value from $table$ where name=?");
//! store.init()?;
//!
//! store.exec("save", &params!["a", "1"])?;
//! let value: String = store.query_first("get", names::STRING, &params!["a"])?;
//! ```
//!
//! ## Predicates
//!
//! Predicates are built without a dialect and rendered against one:
//!
//! ```rust
//! use oxide_store_core::expr::{and, eq, json_at_eq, starts_with, Binding};
//! use oxide_store_core::{Dialect, SqlValue};
//!
//! let p = and([eq("X"), starts_with("Y")]);
//! assert_eq!(p.sql(Dialect::Sqlite), "(value = 'X') and (value like 'Y%')");
//!
//! let (sql, params) = json_at_eq("user/name", "ana")
//!     .to_fragment(Dialect::MySql, Binding::Parameters)
//!     .into_parts();
//! assert_eq!(sql, "json_unquote(json_extract(value,'$.user.name')) = ?");
//! assert_eq!(params, vec![SqlValue::Text("ana".into())]);
//! ```

pub mod config;
pub mod connection;
pub mod cursor;
pub mod dialect;
pub mod entry;
pub mod error;
pub mod executor;
pub mod expr;
pub mod row;
pub mod scanner;
pub mod store;
pub mod tx;
pub mod value;
pub mod vars;

pub use config::StoreConfig;
pub use connection::{same_connection, Connection, ExecResult, NativeTx, PreparedStatement};
pub use cursor::Cursor;
pub use dialect::Dialect;
pub use entry::{DoubleMapEntry, ListEntry, MapEntry, PairListEntry, SqlIndex};
pub use error::{BoxError, ConstraintKind, Error, Result};
pub use executor::Executor;
pub use expr::{BoolExpr, Expression};
pub use row::{Row, Rows, VecRows};
pub use scanner::{names, Scanner, ScannerRegistry, SharedScanner};
pub use store::Store;
pub use tx::{Tx, UnitOfWork};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
pub use vars::Variables;
