//! Transactions run on their own connections, apart from autocommit calls.

mod common;
use common::*;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use oxide_store_core::{names, params, Connection, Error, MapEntry, Store};
use oxide_store_sqlite::SqliteConnection;
use tempfile::TempDir;

fn file_kv(dir: &TempDir) -> Store {
    init_tracing();
    let conn: Arc<dyn Connection> =
        Arc::new(SqliteConnection::open(dir.path().join("kv.db")).unwrap());
    let store = kv_store(&conn, "kv");
    store.init().unwrap();
    store
}

fn count(store: &Store) -> i64 {
    store.query_first("count", names::INT, &[]).unwrap()
}

#[test]
fn autocommit_write_waits_for_open_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_kv(&dir);

    let tx = store.begin_tx().unwrap();
    tx.exec("save", &params!["in_tx", "1"]).unwrap();

    let writer = store.clone();
    let handle = thread::spawn(move || writer.exec("save", &params!["autocommit", "2"]));
    thread::sleep(Duration::from_millis(100));
    assert!(!handle.is_finished());

    tx.rollback().unwrap();
    let saved = handle.join().unwrap().unwrap();
    assert_eq!(saved.affected_rows, 1);

    let value: String = store
        .query_first("get", names::STRING, &params!["autocommit"])
        .unwrap();
    assert_eq!(value, "2");
    assert!(matches!(
        store.query_first::<String>("get", names::STRING, &params!["in_tx"]),
        Err(Error::EntryNotFound)
    ));
}

#[test]
fn autocommit_reads_skip_uncommitted_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_kv(&dir);

    let tx = store.begin_tx().unwrap();
    tx.exec("save", &params!["ana", "1"]).unwrap();
    assert_eq!(count(&store), 0);
    let inside: i64 = tx.query_first("count", names::INT, &[]).unwrap();
    assert_eq!(inside, 1);

    tx.commit().unwrap();
    assert_eq!(count(&store), 1);
}

#[test]
fn one_store_opens_independent_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_kv(&dir);

    let first = store.begin_tx().unwrap();
    let second = store.begin_tx().unwrap();
    assert!(!first.shares_transaction(&second));

    first.exec("save", &params!["ana", "1"]).unwrap();
    let seen: i64 = second.query_first("count", names::INT, &[]).unwrap();
    assert_eq!(seen, 0);

    first.commit().unwrap();
    second.commit().unwrap();
    assert_eq!(count(&store), 1);
}

#[test]
fn conflicting_write_in_memory_fails_busy() {
    let store = ready_kv();

    let tx = store.begin_tx().unwrap();
    tx.exec("save", &params!["ana", "1"]).unwrap();
    assert!(matches!(
        store.exec("save", &params!["bob", "2"]),
        Err(Error::Busy(_))
    ));

    tx.rollback().unwrap();
    store.exec("save", &params!["bob", "2"]).unwrap();
    assert_eq!(count(&store), 1);
}

#[test]
fn open_cursor_holds_no_lock() {
    let store = ready_kv();
    store.exec("save", &params!["a", "1"]).unwrap();
    store.exec("save", &params!["b", "2"]).unwrap();

    let cursor = store
        .query::<MapEntry>("list", names::MAP_ENTRY, &[])
        .unwrap();

    let tx = store.begin_tx().unwrap();
    tx.exec("save", &params!["c", "3"]).unwrap();
    tx.exec("delete", &params!["a"]).unwrap();
    tx.commit().unwrap();

    let keys: Vec<String> = cursor
        .map(|entry| entry.map(|entry| entry.key))
        .collect::<oxide_store_core::Result<_>>()
        .unwrap();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(count(&store), 2);
}
