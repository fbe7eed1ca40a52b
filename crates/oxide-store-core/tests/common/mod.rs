#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use oxide_store_core::{
    Connection, Dialect, Error, ExecResult, NativeTx, PreparedStatement, Result, Rows, SqlValue,
    Store, VecRows,
};

/// Ordered record of everything the mock connections were asked to do.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct Canned {
    rows: HashMap<String, (Vec<String>, Vec<Vec<SqlValue>>)>,
    fail_on: Vec<String>,
    fail_commit: bool,
}

#[derive(Clone)]
struct Backend {
    name: String,
    journal: Journal,
    canned: Arc<Mutex<Canned>>,
}

impl Backend {
    fn record(&self, entry: String) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}: {entry}", self.name));
    }

    fn check(&self, sql: &str) -> Result<()> {
        let canned = self.canned.lock().unwrap();
        if canned.fail_on.iter().any(|f| sql.contains(f.as_str())) {
            return Err(Error::driver(io::Error::new(
                io::ErrorKind::Other,
                format!("rejected: {sql}"),
            )));
        }
        Ok(())
    }

    fn rows(&self, sql: &str) -> Box<dyn Rows> {
        let canned = self.canned.lock().unwrap();
        match canned.rows.get(sql) {
            Some((columns, rows)) => {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                Box::new(VecRows::from_values(&columns, rows.clone()))
            }
            None => Box::new(VecRows::new(Vec::new())),
        }
    }

    fn execute(&self, kind: &str, sql: &str) -> Result<ExecResult> {
        self.check(sql)?;
        self.record(format!("{kind} {sql}"));
        Ok(ExecResult {
            last_inserted: None,
            affected_rows: 1,
        })
    }

    fn query(&self, kind: &str, sql: &str) -> Result<Box<dyn Rows>> {
        self.check(sql)?;
        self.record(format!("{kind} {sql}"));
        Ok(self.rows(sql))
    }
}

/// A recording connection returning canned rows.
pub struct MockConnection {
    backend: Backend,
}

impl MockConnection {
    pub fn new(name: &str) -> Arc<Self> {
        Self::with_journal(name, &Journal::default())
    }

    /// Creates a connection writing to an existing journal.
    pub fn with_journal(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            backend: Backend {
                name: name.to_string(),
                journal: Arc::clone(journal),
                canned: Arc::default(),
            },
        })
    }

    pub fn journal(&self) -> Journal {
        Arc::clone(&self.backend.journal)
    }

    /// Entries recorded by this connection, without the name prefix.
    pub fn entries(&self) -> Vec<String> {
        let prefix = format!("{}: ", self.backend.name);
        self.backend
            .journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }

    pub fn set_rows(&self, sql: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) {
        let columns = columns.iter().map(|c| (*c).to_string()).collect();
        self.backend
            .canned
            .lock()
            .unwrap()
            .rows
            .insert(sql.to_string(), (columns, rows));
    }

    /// Makes every statement containing `fragment` fail.
    pub fn fail_on(&self, fragment: &str) {
        self.backend
            .canned
            .lock()
            .unwrap()
            .fail_on
            .push(fragment.to_string());
    }

    pub fn fail_commit(&self) {
        self.backend.canned.lock().unwrap().fail_commit = true;
    }
}

impl Connection for MockConnection {
    fn execute(&self, sql: &str, _params: &[SqlValue]) -> Result<ExecResult> {
        self.backend.execute("exec", sql)
    }

    fn query(&self, sql: &str, _params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        self.backend.query("query", sql)
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn PreparedStatement>> {
        self.backend.check(sql)?;
        self.backend.record(format!("prepare {sql}"));
        Ok(Box::new(MockPrepared {
            backend: self.backend.clone(),
            sql: sql.to_string(),
        }))
    }

    fn begin(&self) -> Result<Box<dyn NativeTx>> {
        self.backend.record(String::from("begin"));
        Ok(Box::new(MockTx {
            backend: self.backend.clone(),
        }))
    }
}

struct MockPrepared {
    backend: Backend,
    sql: String,
}

impl PreparedStatement for MockPrepared {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn execute(&self, _params: &[SqlValue]) -> Result<ExecResult> {
        self.backend.execute("stmt exec", &self.sql)
    }

    fn query(&self, _params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        self.backend.query("stmt query", &self.sql)
    }
}

struct MockTx {
    backend: Backend,
}

impl NativeTx for MockTx {
    fn execute(&mut self, sql: &str, _params: &[SqlValue]) -> Result<ExecResult> {
        self.backend.execute("tx exec", sql)
    }

    fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<Box<dyn Rows>> {
        self.backend.query("tx query", sql)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        if self.backend.canned.lock().unwrap().fail_commit {
            self.backend.record(String::from("commit failed"));
            return Err(Error::driver(io::Error::new(
                io::ErrorKind::Other,
                "commit rejected",
            )));
        }
        self.backend.record(String::from("commit"));
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.backend.record(String::from("rollback"));
        Ok(())
    }
}

/// A kv store over `conn` with the usual statements registered.
pub fn kv_store(conn: &Arc<MockConnection>, dialect: Dialect) -> Store {
    let store = Store::new(Arc::clone(conn) as Arc<dyn Connection>, dialect);
    store
        .set_table_name("kv")
        .add_table_definition(
            "create table if not exists $table$ (name varchar(255) primary key, value text)$engine$",
        )
        .add_statement("save", "insert into $table$ values (?, ?)")
        .add_statement("get", "select value from $table$ where name=?")
        .add_statement("delete", "delete from $table$ where name=?");
    store
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
