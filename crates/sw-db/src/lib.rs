//! Storage and reporting engine for the stopwatch time tracker.
//!
//! Provides persistence for groups, tasks and time slices using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. Adapters that serve concurrent requests should go through a
//! [`Handle`], which also rejects overlapping operations.
//!
//! # Schema
//!
//! The file holds an ordered key-value layout (see the `bucket` module) with
//! five top-level collections:
//! - `state`: the active-task marker under `activeTask`
//! - `groups`: group records keyed by 8-byte big-endian ID
//! - `tasks`: one nested collection per group, task records keyed by ID
//! - `slices`: one nested collection per `(group, task)`, keyed by start time
//! - `history`: last known list of recently used tasks under `usage`
//!
//! ## Record Format
//!
//! Group, task, active-task and history records are JSON objects. A slice
//! value is the RFC 3339 end timestamp, or empty while the slice is open.
//!
//! ## Timestamp Format
//!
//! Slice keys and values use RFC 3339 UTC with whole seconds
//! (e.g. `2024-01-15T10:30:00Z`), so bytewise key order is chronological.
//!
//! # Transactions
//!
//! Every public operation runs in a single transaction. Writers take an
//! immediate lock; readers see a consistent snapshot.

mod active;
mod bucket;
mod edit;
mod entities;
mod handle;
mod history;
pub mod keys;
mod ledger;
mod usage;

use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use bucket::{Bucket, ROOTS, SCHEMA};

pub use handle::{Handle, OperationGuard};
pub use sw_core::{
    ActiveTask, CostCodeUsage, DateUsage, Group, HistoryTask, Slice, Task, TaskDuration,
    UsageReport,
};

/// How long to wait for another process holding the database lock.
const LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// No database is open.
    #[error("database not ready")]
    NotReady,
    /// Another operation holds the handle.
    #[error("another operation is in progress")]
    Busy,
    #[error("group {0} not found")]
    GroupNotFound(i64),
    #[error("task {task} not found in group {group}")]
    TaskNotFound { group: i64, task: i64 },
    #[error("no slice starting at {start} for task {task} in group {group}")]
    SliceNotFound {
        group: i64,
        task: i64,
        start: String,
    },
    /// The start of a range is not before its end, or a date is unusable.
    #[error("invalid range: {start} is not before {end}")]
    InvalidRange { start: String, end: String },
    /// The operation conflicts with the task's open slice.
    #[error("task {task} in group {group} is running")]
    AlreadyRunning { group: i64, task: i64 },
    #[error("task {task} in group {group} is not running")]
    NotRunning { group: i64, task: i64 },
    /// A stored record could not be decoded.
    #[error("corrupt {record} record: {message}")]
    Corrupt { record: String, message: String },
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// Whether the error reports a missing group, task or slice.
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound(_) | Self::TaskNotFound { .. } | Self::SliceNotFound { .. }
        )
    }

    fn invalid_range(start: impl Display, end: impl Display) -> Self {
        Self::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    fn corrupt(record: impl Display, message: impl Display) -> Self {
        Self::Corrupt {
            record: record.to_string(),
            message: message.to_string(),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// Waits up to one second for a lock held by another process.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(LOCK_TIMEOUT)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema and the top-level buckets.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(SCHEMA)?;
        let tx = self.conn.unchecked_transaction()?;
        for root in ROOTS {
            Bucket::create_if_not_exists(&tx, root, &[])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Closes the database, reporting any error from the final flush.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }

    /// Runs `f` in a write transaction, committing only if it succeeds.
    fn update<T>(
        &mut self,
        f: impl FnOnce(&Connection) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Runs `f` in a read transaction.
    fn view<T>(&self, f: impl FnOnce(&Connection) -> Result<T, DbError>) -> Result<T, DbError> {
        let tx = self.conn.unchecked_transaction()?;
        f(&tx)
    }
}

fn encode_record<T: Serialize>(value: &T, record: impl Display) -> Result<Vec<u8>, DbError> {
    serde_json::to_vec(value).map_err(|err| DbError::corrupt(record, err))
}

fn decode_record<T: DeserializeOwned>(bytes: &[u8], record: impl Display) -> Result<T, DbError> {
    serde_json::from_slice(bytes).map_err(|err| DbError::corrupt(record, err))
}
