//! Groups and tasks.

use rusqlite::Connection;
use sw_core::{Group, Task};

use crate::bucket::{Bucket, GROUPS, SLICES, TASKS};
use crate::keys::{decode_id, encode_id, slice_bucket_key};
use crate::{Database, DbError, decode_record, encode_record};

impl Database {
    /// Adds a group with a new ID and an empty task collection.
    pub fn add_group(&mut self, name: &str) -> Result<Group, DbError> {
        let group = self.update(|conn| {
            let groups = Bucket::top(conn, GROUPS);
            let id = groups.next_sequence()?;
            let group = Group {
                id,
                name: name.to_string(),
            };

            Bucket::create_if_not_exists(conn, TASKS, &encode_id(id))?;
            groups.put(&encode_id(id), &encode_record(&group, "group")?)?;
            Ok(group)
        })?;
        tracing::debug!(group = group.id, name = %group.name, "group added");
        Ok(group)
    }

    /// Adds a task to a group.
    ///
    /// The task ID, its empty slice collection and the task record are
    /// written together.
    pub fn add_task(
        &mut self,
        group_id: i64,
        name: &str,
        cost_code: &str,
    ) -> Result<Task, DbError> {
        let task = self.update(|conn| {
            let tasks = task_bucket(conn, group_id)?;
            let mut task = Task::new(group_id, name, cost_code);
            task.id = tasks.next_sequence()?;

            Bucket::create_if_not_exists(conn, SLICES, &slice_bucket_key(group_id, task.id))?;
            tasks.put(&encode_id(task.id), &encode_record(&task, task_label(&task))?)?;
            Ok(task)
        })?;
        tracing::debug!(group = group_id, task = task.id, name = %task.name, "task added");
        Ok(task)
    }

    pub fn get_group(&self, group_id: i64) -> Result<Group, DbError> {
        self.view(|conn| load_group(conn, group_id))
    }

    pub fn get_task(&self, group_id: i64, task_id: i64) -> Result<Task, DbError> {
        self.view(|conn| load_task(conn, group_id, task_id))
    }

    /// Overwrites an existing group record.
    pub fn save_group(&mut self, group: &Group) -> Result<(), DbError> {
        self.update(|conn| {
            let groups = Bucket::top(conn, GROUPS);
            let key = encode_id(group.id);
            if groups.get(&key)?.is_none() {
                return Err(DbError::GroupNotFound(group.id));
            }
            groups.put(&key, &encode_record(group, "group")?)?;
            Ok(())
        })
    }

    /// Overwrites an existing task record.
    pub fn save_task(&mut self, task: &Task) -> Result<(), DbError> {
        self.update(|conn| {
            let tasks = task_bucket(conn, task.group_id)?;
            if tasks.get(&encode_id(task.id))?.is_none() {
                return Err(DbError::TaskNotFound {
                    group: task.group_id,
                    task: task.id,
                });
            }
            store_task(conn, task)
        })
    }

    /// Lists all groups in ID order. Unreadable records are skipped.
    pub fn read_groups(&self) -> Result<Vec<Group>, DbError> {
        self.view(|conn| {
            let entries = Bucket::top(conn, GROUPS).entries()?;
            Ok(decode_all(entries, "group"))
        })
    }

    /// Lists a group's tasks in ID order. Unreadable records are skipped.
    pub fn read_tasks(&self, group_id: i64) -> Result<Vec<Task>, DbError> {
        self.view(|conn| read_group_tasks(conn, group_id))
    }
}

pub fn task_bucket(conn: &Connection, group_id: i64) -> Result<Bucket<'_>, DbError> {
    Bucket::nested(conn, TASKS, &encode_id(group_id))?.ok_or(DbError::GroupNotFound(group_id))
}

pub fn load_group(conn: &Connection, group_id: i64) -> Result<Group, DbError> {
    let bytes = Bucket::top(conn, GROUPS)
        .get(&encode_id(group_id))?
        .ok_or(DbError::GroupNotFound(group_id))?;
    decode_record(&bytes, format_args!("group {group_id}"))
}

pub fn load_task(conn: &Connection, group_id: i64, task_id: i64) -> Result<Task, DbError> {
    let bytes = task_bucket(conn, group_id)?
        .get(&encode_id(task_id))?
        .ok_or(DbError::TaskNotFound {
            group: group_id,
            task: task_id,
        })?;
    decode_record(&bytes, format_args!("task {group_id}/{task_id}"))
}

/// Writes a task record. The group's task collection must exist.
pub fn store_task(conn: &Connection, task: &Task) -> Result<(), DbError> {
    let tasks = task_bucket(conn, task.group_id)?;
    tasks.put(&encode_id(task.id), &encode_record(task, task_label(task))?)?;
    Ok(())
}

pub fn read_group_tasks(conn: &Connection, group_id: i64) -> Result<Vec<Task>, DbError> {
    let entries = task_bucket(conn, group_id)?.entries()?;
    Ok(decode_all(entries, "task"))
}

fn task_label(task: &Task) -> String {
    format!("task {}/{}", task.group_id, task.id)
}

fn decode_all<T: serde::de::DeserializeOwned>(
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    record: &str,
) -> Vec<T> {
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let id = decode_id(&key).unwrap_or_default();
            match decode_record(&value, format_args!("{record} {id}")) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable record");
                    None
                }
            }
        })
        .collect()
}
