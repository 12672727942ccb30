//! Open/close lifecycle and single-flight admission for adapters.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Database, DbError};

/// An optionally open database plus a busy flag.
///
/// Adapters keep one `Handle` for the life of the process. Operations on a
/// closed handle fail with [`DbError::NotReady`]; [`Handle::begin`] fails with
/// [`DbError::Busy`] while another operation holds the guard.
#[derive(Default)]
pub struct Handle {
    db: Option<Database>,
    busy: Arc<AtomicBool>,
}

/// Marks an operation in progress until dropped.
#[derive(Debug)]
pub struct OperationGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl Handle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the database at `path`. Does nothing if already open.
    pub fn open(&mut self, path: &Path) -> Result<(), DbError> {
        if self.db.is_some() {
            return Ok(());
        }
        self.db = Some(Database::open(path)?);
        tracing::debug!(path = %path.display(), "database opened");
        Ok(())
    }

    /// Closes the database if open.
    pub fn close(&mut self) -> Result<(), DbError> {
        match self.db.take() {
            Some(db) => db.close(),
            None => Ok(()),
        }
    }

    pub const fn is_open(&self) -> bool {
        self.db.is_some()
    }

    pub fn database(&self) -> Result<&Database, DbError> {
        self.db.as_ref().ok_or(DbError::NotReady)
    }

    pub fn database_mut(&mut self) -> Result<&mut Database, DbError> {
        self.db.as_mut().ok_or(DbError::NotReady)
    }

    /// Claims the handle for one logical operation.
    pub fn begin(&self) -> Result<OperationGuard, DbError> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| DbError::Busy)?;
        Ok(OperationGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

impl From<Database> for Handle {
    fn from(db: Database) -> Self {
        Self {
            db: Some(db),
            busy: Arc::default(),
        }
    }
}
