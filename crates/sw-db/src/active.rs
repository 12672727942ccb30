//! The active-task marker.
//!
//! A single persisted `{groupid, taskid}` record names the task the user
//! considers current. Setting it does not start or stop anything; callers
//! stop the previous task and start the new one themselves.

use sw_core::{ActiveTask, Task};

use crate::bucket::{Bucket, STATE};
use crate::entities::load_task;
use crate::{Database, DbError, decode_record, encode_record};

const ACTIVE_TASK_KEY: &[u8] = b"activeTask";

impl Database {
    /// Returns the active task, or `None` if no task is marked active.
    ///
    /// A marker pointing at a missing task fails with a not-found error.
    pub fn get_active_task(&self) -> Result<Option<Task>, DbError> {
        self.view(|conn| {
            let Some(bytes) = Bucket::top(conn, STATE).get(ACTIVE_TASK_KEY)? else {
                return Ok(None);
            };
            let active: ActiveTask = decode_record(&bytes, "active task")?;
            if active.is_none() {
                return Ok(None);
            }
            load_task(conn, active.group_id, active.task_id).map(Some)
        })
    }

    /// Marks a task active. `(0, 0)` clears the marker.
    pub fn set_active_task(&mut self, group_id: i64, task_id: i64) -> Result<(), DbError> {
        let active = ActiveTask::new(group_id, task_id);
        self.update(|conn| {
            Bucket::top(conn, STATE).put(ACTIVE_TASK_KEY, &encode_record(&active, "active task")?)?;
            Ok(())
        })?;
        tracing::debug!(group = group_id, task = task_id, "active task set");
        Ok(())
    }

    /// Clears the active-task marker.
    pub fn clear_active_task(&mut self) -> Result<(), DbError> {
        self.set_active_task(ActiveTask::NONE.group_id, ActiveTask::NONE.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_active_task_initially() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_active_task().unwrap(), None);
    }

    #[test]
    fn set_and_clear_active_task() {
        let mut db = Database::open_in_memory().unwrap();
        let group = db.add_group("A").unwrap();
        let task = db.add_task(group.id, "Design", "").unwrap();

        db.set_active_task(group.id, task.id).unwrap();
        assert_eq!(db.get_active_task().unwrap(), Some(task));

        db.clear_active_task().unwrap();
        assert_eq!(db.get_active_task().unwrap(), None);
    }

    #[test]
    fn setting_active_does_not_start_the_task() {
        let mut db = Database::open_in_memory().unwrap();
        let group = db.add_group("A").unwrap();
        let task = db.add_task(group.id, "Design", "").unwrap();

        db.set_active_task(group.id, task.id).unwrap();
        let active = db.get_active_task().unwrap().unwrap();
        assert!(!active.is_running());
    }

    #[test]
    fn dangling_marker_is_not_found() {
        let mut db = Database::open_in_memory().unwrap();
        db.set_active_task(4, 2).unwrap();
        let err = db.get_active_task().unwrap_err();
        assert!(err.is_not_found());
    }
}
