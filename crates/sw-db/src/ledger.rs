//! Time-slice ledger: starting and stopping tasks.
//!
//! Each task owns a collection of slices keyed by start time. The value of
//! an entry is the end time, or empty while the slice is open. At most one
//! slice is open per task, and it is always the last entry.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use sw_core::{Slice, Task, TaskDuration, split_at_day_boundaries};

use crate::bucket::{Bucket, SLICES};
use crate::entities::{load_task, store_task};
use crate::keys::{decode_time, encode_time, slice_bucket_key, truncate_time};
use crate::{Database, DbError};

impl Database {
    /// Starts recording time on a task.
    ///
    /// Starting a running task changes nothing and reports the existing
    /// start time. Fails with [`DbError::InvalidRange`] if a recorded slice
    /// starts after the current time, since the open slice must stay last.
    pub fn start_task(&mut self, group_id: i64, task_id: i64) -> Result<Task, DbError> {
        self.start_task_at(group_id, task_id, Utc::now())
    }

    pub(crate) fn start_task_at(
        &mut self,
        group_id: i64,
        task_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let now = truncate_time(now);
        let task = self.update(|conn| {
            let mut task = load_task(conn, group_id, task_id)?;
            let slices = slice_bucket(conn, group_id, task_id)?;
            let now_key = encode_time(now);

            let running_since = match slices.last()? {
                Some((key, value)) if value.is_empty() => decode_slice_start(&key, &task)?,
                Some((key, value)) if key == now_key.as_bytes() => {
                    // Restarted within the same second it stopped: reopen that slice.
                    let end = decode_slice_end(&value, &task)?;
                    if let Some(end) = end {
                        task.used -= TaskDuration::between(now, end);
                    }
                    slices.put(&key, &[])?;
                    now
                }
                Some((key, _)) if key.as_slice() > now_key.as_bytes() => {
                    return Err(DbError::invalid_range(
                        &now_key,
                        String::from_utf8_lossy(&key),
                    ));
                }
                _ => {
                    slices.put(now_key.as_bytes(), &[])?;
                    now
                }
            };

            task.running = Some(running_since);
            store_task(conn, &task)?;
            Ok(task)
        })?;
        tracing::debug!(group = group_id, task = task_id, running = ?task.running, "task started");
        Ok(task)
    }

    /// Stops a running task, closing its open slice.
    ///
    /// An open slice that crosses UTC midnight is stored as one slice per
    /// calendar day. The task's used time grows by the full elapsed time.
    pub fn stop_task(&mut self, group_id: i64, task_id: i64) -> Result<Task, DbError> {
        self.stop_task_at(group_id, task_id, Utc::now())
    }

    pub(crate) fn stop_task_at(
        &mut self,
        group_id: i64,
        task_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Task, DbError> {
        let now = truncate_time(now);
        let (task, elapsed) = self.update(|conn| {
            let mut task = load_task(conn, group_id, task_id)?;
            let slices = slice_bucket(conn, group_id, task_id)?;

            let not_running = DbError::NotRunning {
                group: group_id,
                task: task_id,
            };
            let (key, value) = slices.last()?.ok_or(not_running)?;
            if !value.is_empty() {
                return Err(DbError::NotRunning {
                    group: group_id,
                    task: task_id,
                });
            }

            let started = decode_slice_start(&key, &task)?;
            let stopped = now.max(started);
            for (from, to) in split_at_day_boundaries(started, stopped) {
                slices.put(encode_time(from).as_bytes(), encode_time(to).as_bytes())?;
            }

            let elapsed = TaskDuration::between(started, stopped);
            task.used += elapsed;
            task.running = None;
            store_task(conn, &task)?;
            Ok((task, elapsed))
        })?;
        tracing::debug!(group = group_id, task = task_id, %elapsed, "task stopped");
        Ok(task)
    }

    /// Lists slices of a task that start within `[start, end)`.
    ///
    /// Open slices are included with no end. Unreadable entries are skipped.
    pub fn get_slices(
        &self,
        group_id: i64,
        task_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Slice>, DbError> {
        if start >= end {
            return Err(DbError::invalid_range(encode_time(start), encode_time(end)));
        }
        self.view(|conn| {
            let entries = slice_bucket(conn, group_id, task_id)?
                .range(encode_time(start).as_bytes(), encode_time(end).as_bytes())?;
            let mut slices = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                match decode_slice(&key, &value) {
                    Some(slice) => slices.push(slice),
                    None => tracing::warn!(
                        group = group_id,
                        task = task_id,
                        key = %String::from_utf8_lossy(&key),
                        "skipping unreadable slice"
                    ),
                }
            }
            Ok(slices)
        })
    }
}

/// Opens the slice collection of a task.
pub fn slice_bucket(conn: &Connection, group_id: i64, task_id: i64) -> Result<Bucket<'_>, DbError> {
    Bucket::nested(conn, SLICES, &slice_bucket_key(group_id, task_id))?.ok_or(
        DbError::TaskNotFound {
            group: group_id,
            task: task_id,
        },
    )
}

/// Decodes a stored entry; `None` if either half is malformed.
pub fn decode_slice(key: &[u8], value: &[u8]) -> Option<Slice> {
    let start = decode_time(key)?;
    if value.is_empty() {
        return Some(Slice::open(start));
    }
    decode_time(value).map(|end| Slice::closed(start, end))
}

pub fn decode_slice_start(key: &[u8], task: &Task) -> Result<DateTime<Utc>, DbError> {
    decode_time(key).ok_or_else(|| {
        DbError::corrupt(
            format_args!("slice of task {}/{}", task.group_id, task.id),
            format_args!("bad start key {:?}", String::from_utf8_lossy(key)),
        )
    })
}

pub fn decode_slice_end(value: &[u8], task: &Task) -> Result<Option<DateTime<Utc>>, DbError> {
    if value.is_empty() {
        return Ok(None);
    }
    decode_time(value).map(Some).ok_or_else(|| {
        DbError::corrupt(
            format_args!("slice of task {}/{}", task.group_id, task.id),
            format_args!("bad end value {:?}", String::from_utf8_lossy(value)),
        )
    })
}
