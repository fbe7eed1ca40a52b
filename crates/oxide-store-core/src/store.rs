//! The statement registry and data-access handle.
//!
//! A [`Store`] owns one connection plus everything registered against it:
//! template variables, table definitions, named statements (generic and
//! per-dialect), migration scripts and scanners. [`Store::init`] runs the
//! table definitions and compiles every named statement once; after that the
//! registry is frozen.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::connection::{same_connection, Connection, ExecResult, PreparedStatement};
use crate::cursor::Cursor;
use crate::dialect::Dialect;
use crate::entry::SqlIndex;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::scanner::{self, names, ScannerRegistry, SharedScanner};
use crate::tx::Tx;
use crate::value::SqlValue;
use crate::vars::{self, Variables};

#[derive(Default)]
struct Registry {
    variables: Variables,
    table_definitions: Vec<String>,
    statements: BTreeMap<String, String>,
    dialect_statements: HashMap<Dialect, BTreeMap<String, String>>,
    migrations: Vec<String>,
    scanners: ScannerRegistry,
    compiled: HashMap<String, Arc<dyn PreparedStatement>>,
    resolved: HashMap<String, String>,
    initialized: bool,
}

impl Registry {
    fn statement(&self, name: &str) -> Result<&Arc<dyn PreparedStatement>> {
        if !self.initialized {
            return Err(Error::Init);
        }
        self.compiled
            .get(name)
            .ok_or_else(|| Error::StatementNotFound(name.to_string()))
    }

    fn statement_sql(&self, name: &str) -> Result<&str> {
        if !self.initialized {
            return Err(Error::Init);
        }
        self.resolved
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::StatementNotFound(name.to_string()))
    }
}

struct Inner {
    conn: Arc<dyn Connection>,
    dialect: Dialect,
    registry: RwLock<Registry>,
}

/// A dialect-aware data-access handle over one connection.
///
/// Cloning is cheap; clones share the connection and the registry.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Creates a store over `conn` speaking `dialect`.
    ///
    /// The dialect's default variables and the built-in scanners are
    /// registered immediately.
    #[must_use]
    pub fn new(conn: Arc<dyn Connection>, dialect: Dialect) -> Self {
        let registry = Registry {
            variables: dialect.default_variables().into_iter().collect(),
            scanners: ScannerRegistry::with_defaults(),
            ..Registry::default()
        };
        Self {
            inner: Arc::new(Inner {
                conn,
                dialect,
                registry: RwLock::new(registry),
            }),
        }
    }

    /// Creates a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DialectNotSupported`] if the configured dialect is not
    /// supported.
    pub fn from_config(conn: Arc<dyn Connection>, config: &StoreConfig) -> Result<Self> {
        let store = Self::new(conn, config.dialect()?);
        {
            let mut registry = store.write();
            if let Some(prefix) = &config.table_prefix {
                registry.variables.set(vars::PREFIX, prefix.as_str());
            }
            if let Some(name) = &config.table_name {
                registry.variables.set(vars::TABLE, name.as_str());
            }
            registry.variables.extend(config.variables.clone());
        }
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    /// Returns `true` for SQLite stores.
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.inner.dialect == Dialect::Sqlite
    }

    /// Returns `true` once [`Store::init`] has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.read().initialized
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.inner.conn
    }

    /// Returns `true` if both stores run on the same connection.
    #[must_use]
    pub fn same_connection(&self, other: &Self) -> bool {
        same_connection(&self.inner.conn, &other.inner.conn)
    }

    /// Sets a template variable. Ignored after [`Store::init`].
    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) -> &Self {
        let name = name.into();
        let mut registry = self.write();
        if registry.initialized {
            warn!(variable = %name, "store already initialized, variable ignored");
        } else {
            registry.variables.set(name, value);
        }
        self
    }

    /// Sets `$prefix$`.
    pub fn set_table_prefix(&self, prefix: impl Into<String>) -> &Self {
        self.set_variable(vars::PREFIX, prefix)
    }

    /// Sets `$table$`.
    pub fn set_table_name(&self, name: impl Into<String>) -> &Self {
        self.set_variable(vars::TABLE, name)
    }

    /// Returns a copy of the template variables.
    #[must_use]
    pub fn variables(&self) -> Variables {
        self.read().variables.clone()
    }

    /// Substitutes template variables in `sql`.
    #[must_use]
    pub fn resolve(&self, sql: &str) -> String {
        self.read().variables.resolve(sql)
    }

    /// Registers a table definition run by [`Store::init`]. Ignored after init.
    pub fn add_table_definition(&self, ddl: impl Into<String>) -> &Self {
        let mut registry = self.write();
        if registry.initialized {
            warn!("store already initialized, table definition ignored");
        } else {
            registry.table_definitions.push(ddl.into());
        }
        self
    }

    /// Registers a named statement. Ignored after init.
    pub fn add_statement(&self, name: impl Into<String>, sql: impl Into<String>) -> &Self {
        let name = name.into();
        let mut registry = self.write();
        if registry.initialized {
            warn!(statement = %name, "store already initialized, statement ignored");
        } else {
            registry.statements.insert(name, sql.into());
        }
        self
    }

    /// Registers a statement used instead of the generic one under `dialect`.
    /// Ignored after init.
    pub fn add_dialect_statement(
        &self,
        dialect: Dialect,
        name: impl Into<String>,
        sql: impl Into<String>,
    ) -> &Self {
        let name = name.into();
        let mut registry = self.write();
        if registry.initialized {
            warn!(statement = %name, %dialect, "store already initialized, statement ignored");
        } else {
            registry
                .dialect_statements
                .entry(dialect)
                .or_default()
                .insert(name, sql.into());
        }
        self
    }

    /// Registers a script run by [`Store::migrate`].
    pub fn add_migration_script(&self, sql: impl Into<String>) -> &Self {
        self.write().migrations.push(sql.into());
        self
    }

    /// Registers a scanner, replacing any scanner with the same name.
    pub fn register_scanner<T, F>(&self, name: impl Into<String>, scanner: F) -> &Self
    where
        T: 'static,
        F: Fn(&Row) -> Result<T> + Send + Sync + 'static,
    {
        self.write().scanners.register_fn(name, scanner);
        self
    }

    pub(crate) fn scanner<T: 'static>(&self, name: &str) -> Result<SharedScanner<T>> {
        self.read().scanners.get(name)
    }

    pub(crate) fn statement_sql(&self, name: &str) -> Result<String> {
        self.read().statement_sql(name).map(str::to_string)
    }

    /// Runs the table definitions and compiles the named statements.
    ///
    /// Calling `init` on an initialized store does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first table definition or prepare failure. Table
    /// definitions that already ran are not undone.
    pub fn init(&self) -> Result<()> {
        let dialect = self.inner.dialect;
        let mut registry = self.write();
        if registry.initialized {
            debug!("store already initialized");
            return Ok(());
        }
        info!(%dialect, "Initializing store");

        match dialect {
            Dialect::Sqlite => registry
                .scanners
                .register_fn(names::SQLITE_INDEX, scanner::scan_sqlite_index),
            Dialect::MySql => registry
                .scanners
                .register_fn(names::MYSQL_INDEX, scanner::scan_mysql_index),
        };

        for ddl in &registry.table_definitions {
            let sql = registry.variables.resolve(ddl);
            debug!(sql = %sql, "Executing table definition");
            self.inner.conn.execute(&sql, &[])?;
        }

        let mut templates = registry.statements.clone();
        if let Some(overrides) = registry.dialect_statements.get(&dialect) {
            templates.extend(overrides.clone());
        }

        let mut compiled = HashMap::with_capacity(templates.len());
        let mut resolved = HashMap::with_capacity(templates.len());
        for (name, template) in templates {
            let sql = registry.variables.resolve(&template);
            debug!(statement = %name, sql = %sql, "Preparing statement");
            let prepared = self.inner.conn.prepare(&sql)?;
            compiled.insert(name.clone(), Arc::from(prepared));
            resolved.insert(name, sql);
        }

        registry.compiled = compiled;
        registry.resolved = resolved;
        registry.initialized = true;
        info!(statements = registry.compiled.len(), "Store initialized");
        Ok(())
    }

    /// Runs the migration scripts in registration order.
    ///
    /// Scripts run on every call; they are expected to be idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] before init, or the first failing script's
    /// error. Scripts that already ran are not undone.
    pub fn migrate(&self) -> Result<()> {
        let registry = self.write();
        if !registry.initialized {
            return Err(Error::Init);
        }
        info!(scripts = registry.migrations.len(), "Running migration scripts");
        for script in &registry.migrations {
            let sql = registry.variables.resolve(script);
            debug!(sql = %sql, "Executing migration script");
            self.inner.conn.execute(&sql, &[])?;
        }
        Ok(())
    }

    /// Executes the named statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] before init, [`Error::StatementNotFound`] for
    /// unknown names, or the driver error.
    pub fn exec(&self, name: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let registry = self.write();
        let statement = registry.statement(name)?;
        debug!(statement = %name, "Executing statement");
        statement.execute(params)
    }

    /// Runs the named statement as a query, scanning rows with `scanner`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`], [`Error::StatementNotFound`],
    /// [`Error::ScannerNotFound`], [`Error::ScannerTypeMismatch`] or the
    /// driver error.
    pub fn query<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        let registry = self.read();
        let statement = registry.statement(name)?;
        let scanner = registry.scanners.get::<T>(scanner)?;
        debug!(statement = %name, "Querying statement");
        let rows = statement.query(params)?;
        Ok(Cursor::new(rows, scanner))
    }

    /// Runs the named statement and scans its first row.
    ///
    /// # Errors
    ///
    /// Same as [`Store::query`], plus [`Error::EntryNotFound`] when no row
    /// matches.
    pub fn query_first<T: 'static>(
        &self,
        name: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<T> {
        self.query(name, scanner, params)?.first()
    }

    /// Executes ad-hoc SQL after variable substitution.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub fn raw_exec(&self, sql: &str, params: &[SqlValue]) -> Result<ExecResult> {
        let registry = self.write();
        let sql = registry.variables.resolve(sql);
        debug!(sql = %sql, "Executing SQL");
        self.inner.conn.execute(&sql, params)
    }

    /// Runs an ad-hoc query after variable substitution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScannerNotFound`], [`Error::ScannerTypeMismatch`] or
    /// the driver error.
    pub fn raw_query<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<Cursor<T>> {
        let registry = self.read();
        let scanner = registry.scanners.get::<T>(scanner)?;
        let sql = registry.variables.resolve(sql);
        debug!(sql = %sql, "Querying SQL");
        let rows = self.inner.conn.query(&sql, params)?;
        Ok(Cursor::new(rows, scanner))
    }

    /// Runs an ad-hoc query and scans its first row.
    ///
    /// # Errors
    ///
    /// Same as [`Store::raw_query`], plus [`Error::EntryNotFound`] when no
    /// row matches.
    pub fn raw_query_first<T: 'static>(
        &self,
        sql: &str,
        scanner: &str,
        params: &[SqlValue],
    ) -> Result<T> {
        self.raw_query(sql, scanner, params)?.first()
    }

    /// Returns `true` if `index.table` has an index named `index.name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] before init, or the driver error.
    pub fn table_has_index(&self, index: &SqlIndex) -> Result<bool> {
        if !self.is_initialized() {
            return Err(Error::Init);
        }
        let dialect = self.inner.dialect;
        let table = self.resolve(&index.table);
        let (sql, scanner) = match dialect {
            Dialect::Sqlite => (
                format!("PRAGMA index_list({})", dialect.quote_string(&table)),
                names::SQLITE_INDEX,
            ),
            Dialect::MySql => (format!("SHOW INDEX FROM {table}"), names::MYSQL_INDEX),
        };
        let mut cursor = self.raw_query::<SqlIndex>(&sql, scanner, &[])?;
        while cursor.has_next()? {
            if cursor.entry()?.name == index.name {
                return Ok(true);
            }
        }
        cursor.close()?;
        Ok(false)
    }

    /// Creates a unique index unless it exists. With `force_update` an
    /// existing index is dropped and recreated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Init`] before init, or the driver error.
    pub fn add_unique_index(&self, index: &SqlIndex, force_update: bool) -> Result<()> {
        let exists = self.table_has_index(index)?;
        let table = self.resolve(&index.table);
        let sqlite = self.is_sqlite();

        if exists && force_update {
            let drop = if sqlite {
                format!("drop index if exists {}", index.name)
            } else {
                format!("drop index {} on {table}", index.name)
            };
            self.raw_exec(&drop, &[])?;
        }

        if !exists || force_update {
            let fields = index.fields.join(",");
            let create = if sqlite {
                format!(
                    "create unique index if not exists {} on {table}({fields})",
                    index.name
                )
            } else {
                format!("create unique index {} on {table}({fields})", index.name)
            };
            self.raw_exec(&create, &[])?;
            info!(index = %index.name, %table, "Unique index created");
        }
        Ok(())
    }

    /// Opens a transaction on this store's connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error.
    pub fn begin_tx(&self) -> Result<Tx> {
        debug!(dialect = %self.inner.dialect, "Beginning transaction");
        let native = self.inner.conn.begin()?;
        Ok(Tx::new(self.clone(), native))
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.read();
        f.debug_struct("Store")
            .field("dialect", &self.inner.dialect)
            .field("initialized", &registry.initialized)
            .field("statements", &registry.compiled.len())
            .field("scanners", &registry.scanners)
            .finish_non_exhaustive()
    }
}
