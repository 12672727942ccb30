//! Recently used tasks.

use sw_core::{HistoryTask, Task};

use crate::bucket::{Bucket, HISTORY};
use crate::entities::load_task;
use crate::{Database, DbError, decode_record, encode_record};

const USAGE_KEY: &[u8] = b"usage";

impl Database {
    /// Replaces the stored history list.
    pub fn save_history(&mut self, history: &[HistoryTask]) -> Result<(), DbError> {
        self.update(|conn| {
            Bucket::top(conn, HISTORY).put(USAGE_KEY, &encode_record(&history, "history")?)?;
            Ok(())
        })?;
        tracing::debug!(entries = history.len(), "history saved");
        Ok(())
    }

    /// Returns the tasks in the stored history, skipping any that no longer exist.
    pub fn read_history(&self) -> Result<Vec<Task>, DbError> {
        self.view(|conn| {
            let history: Vec<HistoryTask> = match Bucket::top(conn, HISTORY).get(USAGE_KEY)? {
                Some(bytes) => decode_record(&bytes, "history")?,
                None => Vec::new(),
            };

            let mut tasks = Vec::with_capacity(history.len());
            for entry in history {
                match load_task(conn, entry.group_id, entry.id) {
                    Ok(task) => tasks.push(task),
                    Err(err) if err.is_not_found() => {
                        tracing::debug!(group = entry.group_id, task = entry.id, "history entry gone");
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(tasks)
        })
    }
}
