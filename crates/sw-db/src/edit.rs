//! Direct slice editing with used-time bookkeeping.
//!
//! Edits adjust the task's used time by the difference they make instead
//! of recomputing it from the ledger.

use chrono::{DateTime, Utc};
use sw_core::{Task, TaskDuration};

use crate::entities::{load_task, store_task};
use crate::keys::{encode_time, truncate_time};
use crate::ledger::{decode_slice_end, slice_bucket};
use crate::{Database, DbError};

impl Database {
    /// Writes the slice `[start, end]`, replacing any slice with the same start.
    ///
    /// The open slice of a running task cannot be edited, and no slice may be
    /// placed after it; stop the task first.
    pub fn set_slice(
        &mut self,
        group_id: i64,
        task_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let start = truncate_time(start);
        let end = truncate_time(end);
        if start >= end {
            return Err(DbError::invalid_range(encode_time(start), encode_time(end)));
        }

        let task = self.update(|conn| {
            let mut task = load_task(conn, group_id, task_id)?;
            let slices = slice_bucket(conn, group_id, task_id)?;
            let key = encode_time(start);

            if let Some((last_key, last_value)) = slices.last()? {
                if last_value.is_empty() && key.as_bytes() >= last_key.as_slice() {
                    return Err(DbError::AlreadyRunning {
                        group: group_id,
                        task: task_id,
                    });
                }
            }

            if let Some(previous) = slices.get(key.as_bytes())? {
                if let Some(previous_end) = decode_slice_end(&previous, &task)? {
                    task.used -= TaskDuration::between(start, previous_end);
                }
            }

            slices.put(key.as_bytes(), encode_time(end).as_bytes())?;
            task.used += TaskDuration::between(start, end);
            store_task(conn, &task)?;
            Ok(task)
        })?;
        tracing::debug!(group = group_id, task = task_id, %start, %end, "slice set");
        Ok(task)
    }

    /// Deletes the slice starting at `start`.
    ///
    /// Removing the open slice of a running task cancels the run.
    pub fn remove_slice(
        &mut self,
        group_id: i64,
        task_id: i64,
        start: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let start = truncate_time(start);
        let task = self.update(|conn| {
            let mut task = load_task(conn, group_id, task_id)?;
            let slices = slice_bucket(conn, group_id, task_id)?;
            let key = encode_time(start);

            let previous = slices
                .get(key.as_bytes())?
                .ok_or_else(|| DbError::SliceNotFound {
                    group: group_id,
                    task: task_id,
                    start: key.clone(),
                })?;
            match decode_slice_end(&previous, &task)? {
                Some(previous_end) => task.used -= TaskDuration::between(start, previous_end),
                None => task.running = None,
            }

            slices.delete(key.as_bytes())?;
            store_task(conn, &task)?;
            Ok(task)
        })?;
        tracing::debug!(group = group_id, task = task_id, %start, "slice removed");
        Ok(task)
    }
}
