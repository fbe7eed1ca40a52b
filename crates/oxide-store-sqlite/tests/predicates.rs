//! Predicates rendered for SQLite and executed against real rows.

mod common;
use common::*;

use oxide_store_core::expr::{
    and, contains, eq, json_at_ends_with, json_at_ge, json_at_gt, json_at_lt,
    json_at_starts_with, json_contains_path, not, or, starts_with, Binding, BoolExpr,
};
use oxide_store_core::{names, params, Dialect, SqlValue, Store};

fn matching(store: &Store, predicate: &BoolExpr) -> Vec<String> {
    let sql = format!(
        "select name from $table$ where {} order by name",
        predicate.sql(Dialect::Sqlite)
    );
    collect(store, &sql, &[])
}

fn matching_bound(store: &Store, predicate: &BoolExpr) -> Vec<String> {
    let (clause, params) = predicate
        .to_fragment(Dialect::Sqlite, Binding::Parameters)
        .into_parts();
    let sql = format!("select name from $table$ where {clause} order by name");
    collect(store, &sql, &params)
}

fn collect(store: &Store, sql: &str, params: &[SqlValue]) -> Vec<String> {
    store
        .raw_query::<String>(sql, names::STRING, params)
        .unwrap()
        .collect::<oxide_store_core::Result<_>>()
        .unwrap()
}

fn words() -> Store {
    let store = ready_kv();
    for (i, word) in ["X", "Yes", "Yellow", "Z", "it's"].iter().enumerate() {
        store.exec("save", &params![format!("w{i}"), *word]).unwrap();
    }
    store
}

fn people() -> Store {
    let store = ready_kv();
    let docs = [
        ("bob", serde_json::json!({"name": "Bob", "age": 40})),
        ("jane", serde_json::json!({"name": "Jane", "age": 25})),
        (
            "john",
            serde_json::json!({"name": "John", "age": 31, "tags": {"admin": true}}),
        ),
    ];
    for (name, doc) in &docs {
        store.exec("save", &params![*name, doc]).unwrap();
    }
    store
}

#[test]
fn plain_column_predicates() {
    let store = words();

    assert_eq!(matching(&store, &eq("X")), vec!["w0"]);
    assert_eq!(
        matching(&store, &or([eq("X"), starts_with("Ye")])),
        vec!["w0", "w1", "w2"]
    );
    assert_eq!(matching(&store, &contains("ell")), vec!["w2"]);
    assert_eq!(
        matching(&store, &and([starts_with("Y"), not(eq("Yes"))])),
        vec!["w2"]
    );
    assert_eq!(matching(&store, &eq("it's")), vec!["w4"]);
    assert!(matching(&store, &BoolExpr::False).is_empty());
    assert_eq!(matching(&store, &and([])).len(), 5);
}

#[test]
fn bound_parameters_match_inline() {
    let store = words();
    for predicate in [
        eq("it's"),
        or([eq("X"), starts_with("Ye")]),
        not(contains("e")),
    ] {
        assert_eq!(matching(&store, &predicate), matching_bound(&store, &predicate));
    }
}

#[test]
fn json_path_predicates() {
    let store = people();

    assert_eq!(matching(&store, &json_at_gt("age", 30)), vec!["bob", "john"]);
    assert_eq!(matching(&store, &json_at_lt("age", 30.5)), vec!["jane"]);
    assert_eq!(
        matching(&store, &json_contains_path("tags/admin")),
        vec!["john"]
    );
    assert_eq!(
        matching(&store, &json_at_starts_with("name", "J")),
        vec!["jane", "john"]
    );
    assert_eq!(
        matching_bound(
            &store,
            &and([json_at_ge("$.age", 31), json_at_ends_with(".name", "n")])
        ),
        vec!["john"]
    );
}
