//! Rollback registry.
//!
//! The backup engine only *registers* compensations through [`Rollbacker`];
//! when and whether they run is up to the caller. Two sequences are kept:
//!
//! - **undo** actions, prepended on registration so the most recent runs first;
//! - **deferred** actions, appended and meant to run whatever the outcome
//!   (commit or rollback), typically to release the backup.
//!
//! [`RollbackStack`] is the in-process implementation used by `local_backup`
//! callers and the tests.
//!
//! ```no_run
//! # use backup_guard::{local_backup, RollbackStack};
//! # use std::path::Path;
//! # fn run() -> backup_guard::Result<()> {
//! let mut rb = RollbackStack::new();
//! local_backup(Some(&mut rb), Path::new("/srv/app/config.toml"), None)?;
//! // ... mutate the file ...
//! # let mutation_failed = false;
//! if mutation_failed {
//!     rb.abort()?; // restore, then drop the backup
//! } else {
//!     rb.commit()?; // drop the backup
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::errors::Result;

/// A compensation registered by the engine and run later by the caller.
pub type Action = Box<dyn FnOnce() -> Result<()> + Send>;

/// Capability the engine needs from an undo stack.
pub trait Rollbacker {
    /// Register an undo action ahead of all previously registered ones.
    fn push_front(&mut self, action: Action);

    /// Register an action that runs on both commit and rollback, after undo.
    fn push_defer(&mut self, action: Action);
}

/// LIFO undo sequence plus an always-run deferred sequence.
#[must_use = "RollbackStack must be committed or aborted"]
#[derive(Default)]
pub struct RollbackStack {
    undo: VecDeque<Action>,
    deferred: Vec<Action>,
}

impl RollbackStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty() && self.deferred.is_empty()
    }

    /// Run every undo action, most recent first.
    ///
    /// Keeps going after a failure so later compensations still get their
    /// chance; returns the first error.
    pub fn rollback(&mut self) -> Result<()> {
        let actions: Vec<Action> = self.undo.drain(..).collect();
        debug!(count = actions.len(), "running undo actions");
        run_all(actions, "undo")
    }

    /// Run the deferred actions in registration order, same error policy as `rollback`.
    pub fn run_deferred(&mut self) -> Result<()> {
        let actions: Vec<Action> = self.deferred.drain(..).collect();
        debug!(count = actions.len(), "running deferred actions");
        run_all(actions, "deferred")
    }

    /// Success path: forget the undo actions and release resources.
    pub fn commit(&mut self) -> Result<()> {
        self.undo.clear();
        self.run_deferred()
    }

    /// Failure path: undo, then release resources. Both phases always run.
    pub fn abort(&mut self) -> Result<()> {
        let undone = self.rollback();
        let released = self.run_deferred();
        undone.and(released)
    }
}

fn run_all(actions: Vec<Action>, phase: &'static str) -> Result<()> {
    let mut first = None;
    for action in actions {
        if let Err(e) = action() {
            warn!(phase, code = e.code(), error = %e, "compensation failed");
            if first.is_none() {
                first = Some(e);
            }
        }
    }
    first.map_or(Ok(()), Err)
}

impl Rollbacker for RollbackStack {
    fn push_front(&mut self, action: Action) {
        self.undo.push_front(action);
    }

    fn push_defer(&mut self, action: Action) {
        self.deferred.push(action);
    }
}

impl Drop for RollbackStack {
    fn drop(&mut self) {
        if !self.deferred.is_empty() {
            warn!(
                pending = self.deferred.len(),
                "RollbackStack dropped with pending deferred actions; backups left on disk"
            );
        }
    }
}

impl std::fmt::Debug for RollbackStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollbackStack")
            .field("undo", &self.undo.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
