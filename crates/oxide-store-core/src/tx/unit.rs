use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};
use crate::store::Store;

use super::Tx;

type Hook = Box<dyn FnOnce() -> Result<()> + Send>;

/// The ambient transaction of one logical operation.
///
/// The first store asked for a transaction opens the primary one. Stores on
/// the same connection reuse it. A store on another connection gets its own
/// transaction, whose commit and rollback are queued as hooks that run after
/// the primary finishes.
///
/// This is not a two-phase commit: if a hook fails, hooks that already ran
/// stay applied and the failure is reported as [`Error::Hooks`].
///
/// ```rust,ignore
/// let mut uow = UnitOfWork::new();
/// uow.transaction(&users)?.exec("insert_user", &params!["ana"])?;
/// uow.transaction(&audit)?.exec("insert_event", &params!["user created"])?;
/// uow.commit()?;
/// ```
#[derive(Default)]
pub struct UnitOfWork {
    primary: Option<Tx>,
    secondaries: Vec<Tx>,
    commit_hooks: Vec<Hook>,
    rollback_hooks: Vec<Hook>,
}

impl UnitOfWork {
    /// Creates a unit of work with no transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a transaction for `store`, opening one only when no
    /// transaction of this unit runs on the store's connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error if a new transaction cannot be started.
    pub fn transaction(&mut self, store: &Store) -> Result<Tx> {
        let Some(primary) = &self.primary else {
            let tx = store.begin_tx()?;
            self.primary = Some(tx.clone());
            return Ok(tx);
        };
        if primary.store().same_connection(store) {
            return Ok(primary.with_store(store));
        }
        if let Some(secondary) = self
            .secondaries
            .iter()
            .find(|tx| tx.store().same_connection(store))
        {
            return Ok(secondary.with_store(store));
        }

        debug!(dialect = %store.dialect(), "Opening transaction on another connection");
        let tx = store.begin_tx()?;
        let on_commit = tx.clone();
        self.commit_hooks.push(Box::new(move || on_commit.commit()));
        let on_rollback = tx.clone();
        self.rollback_hooks.push(Box::new(move || on_rollback.rollback()));
        self.secondaries.push(tx.clone());
        Ok(tx)
    }

    /// Queues `hook` to run after the primary transaction commits.
    pub fn on_commit<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.commit_hooks.push(Box::new(hook));
        self
    }

    /// Queues `hook` to run after the primary transaction rolls back.
    pub fn on_rollback<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        self.rollback_hooks.push(Box::new(hook));
        self
    }

    /// Returns `true` once a transaction has been opened.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.primary.is_some()
    }

    /// Returns the primary transaction.
    #[must_use]
    pub fn executor(&self) -> Option<&Tx> {
        self.primary.as_ref()
    }

    /// Commits the primary transaction, then runs the commit hooks in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns the primary's commit error without running any hook, or
    /// [`Error::Hooks`] for the first failing hook. Secondary transactions
    /// whose hook did not run are rolled back.
    pub fn commit(self) -> Result<()> {
        let Self {
            primary,
            commit_hooks,
            ..
        } = self;
        if let Some(primary) = primary {
            primary.commit()?;
        }
        run_hooks(commit_hooks)
    }

    /// Rolls the primary transaction back, then runs the rollback hooks in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns the primary's rollback error without running any hook, or
    /// [`Error::Hooks`] for the first failing hook.
    pub fn rollback(self) -> Result<()> {
        let Self {
            primary,
            rollback_hooks,
            ..
        } = self;
        if let Some(primary) = primary {
            primary.rollback()?;
        }
        run_hooks(rollback_hooks)
    }
}

fn run_hooks(hooks: Vec<Hook>) -> Result<()> {
    let total = hooks.len();
    for (completed, hook) in hooks.into_iter().enumerate() {
        if let Err(err) = hook() {
            return Err(Error::Hooks {
                completed,
                remaining: total - completed - 1,
                source: Box::new(err),
            });
        }
    }
    Ok(())
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("primary", &self.primary)
            .field("secondaries", &self.secondaries.len())
            .field("commit_hooks", &self.commit_hooks.len())
            .field("rollback_hooks", &self.rollback_hooks.len())
            .finish()
    }
}
