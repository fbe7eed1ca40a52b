#![allow(dead_code)]

use std::sync::Arc;

use oxide_store_core::{Connection, Dialect, Store};
use oxide_store_sqlite::SqliteConnection;

pub fn memory() -> Arc<dyn Connection> {
    Arc::new(SqliteConnection::open_in_memory().unwrap())
}

/// Registers the kv table and its statements on a fresh store over `conn`.
pub fn kv_store(conn: &Arc<dyn Connection>, table: &str) -> Store {
    let store = Store::new(Arc::clone(conn), Dialect::Sqlite);
    store
        .set_table_name(table)
        .add_table_definition(
            "create table if not exists $table$ (name varchar(255) primary key, value text)",
        )
        .add_statement("save", "insert into $table$ values (?, ?)")
        .add_statement("update", "update $table$ set value=? where name=?")
        .add_statement("get", "select value from $table$ where name=?")
        .add_statement("delete", "delete from $table$ where name=?")
        .add_statement("list", "select name, value from $table$ order by name")
        .add_statement("count", "select count(*) from $table$");
    store
}

/// A kv store over a private in-memory database, already initialized.
pub fn ready_kv() -> Store {
    init_tracing();
    let store = kv_store(&memory(), "kv");
    store.init().unwrap();
    store
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
