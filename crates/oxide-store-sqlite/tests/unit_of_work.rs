//! Transactions spanning stores and connections on real databases.

mod common;
use common::*;

use oxide_store_core::{names, params, Error, Store, UnitOfWork};

fn count(store: &Store) -> i64 {
    store.query_first("count", names::INT, &[]).unwrap()
}

fn pair() -> (Store, Store) {
    init_tracing();
    let users = kv_store(&memory(), "users");
    let audit = kv_store(&memory(), "audit");
    users.init().unwrap();
    audit.init().unwrap();
    (users, audit)
}

#[test]
fn commit_spans_connections() {
    let (users, audit) = pair();

    let mut uow = UnitOfWork::new();
    uow.transaction(&users)
        .unwrap()
        .exec("save", &params!["ana", "admin"])
        .unwrap();
    uow.transaction(&audit)
        .unwrap()
        .exec("save", &params!["e1", "created ana"])
        .unwrap();
    uow.commit().unwrap();

    assert_eq!(count(&users), 1);
    assert_eq!(count(&audit), 1);
}

#[test]
fn rollback_spans_connections() {
    let (users, audit) = pair();

    let mut uow = UnitOfWork::new();
    uow.transaction(&users)
        .unwrap()
        .exec("save", &params!["ana", "admin"])
        .unwrap();
    uow.transaction(&audit)
        .unwrap()
        .exec("save", &params!["e1", "created ana"])
        .unwrap();
    let inside: i64 = uow
        .transaction(&users)
        .unwrap()
        .query_first("count", names::INT, &[])
        .unwrap();
    assert_eq!(inside, 1);
    uow.rollback().unwrap();

    assert_eq!(count(&users), 0);
    assert_eq!(count(&audit), 0);
}

#[test]
fn stores_sharing_a_connection_share_one_transaction() {
    init_tracing();
    let conn = memory();
    let users = kv_store(&conn, "users");
    let roles = kv_store(&conn, "roles");
    users.init().unwrap();
    roles.init().unwrap();

    let mut uow = UnitOfWork::new();
    let first = uow.transaction(&users).unwrap();
    let second = uow.transaction(&roles).unwrap();
    assert!(first.shares_transaction(&second));
    first.exec("save", &params!["ana", "1"]).unwrap();
    second.exec("save", &params!["admin", "ana"]).unwrap();
    uow.rollback().unwrap();

    assert_eq!(count(&users), 0);
    assert_eq!(count(&roles), 0);
    assert!(matches!(
        first.exec("save", &params!["bob", "2"]),
        Err(Error::TransactionNotFound)
    ));
}

#[test]
fn failed_hook_leaves_later_connections_rolled_back() {
    let (users, audit) = pair();

    let mut uow = UnitOfWork::new();
    uow.transaction(&users)
        .unwrap()
        .exec("save", &params!["ana", "admin"])
        .unwrap();
    uow.on_commit(|| Err(Error::EntryNotFound));
    uow.transaction(&audit)
        .unwrap()
        .exec("save", &params!["e1", "created ana"])
        .unwrap();

    let err = uow.commit().unwrap_err();
    assert!(matches!(
        err,
        Error::Hooks {
            completed: 0,
            remaining: 1,
            ..
        }
    ));
    assert_eq!(count(&users), 1);
    assert_eq!(count(&audit), 0);
}

#[test]
fn duplicate_inside_transaction_keeps_it_usable() {
    let (users, _) = pair();

    let tx = users.begin_tx().unwrap();
    tx.exec("save", &params!["ana", "1"]).unwrap();
    let err = tx.exec("save", &params!["ana", "2"]).unwrap_err();
    assert!(err.constraint().is_some());
    tx.exec("save", &params!["bob", "2"]).unwrap();
    tx.commit().unwrap();

    assert_eq!(count(&users), 2);
}
