//! Tracker entities and their stored record layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::TaskDuration;

/// A top-level container for related tasks, such as a project or client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// A trackable unit of work inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    #[serde(rename = "groupid")]
    pub group_id: i64,
    pub name: String,
    /// Free-form label used to bucket tasks in usage reports. May be empty.
    #[serde(rename = "costcode", default)]
    pub cost_code: String,
    /// Sum of all closed slice durations.
    #[serde(rename = "duration", default)]
    pub used: TaskDuration,
    /// Start of the open slice, if the task is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates an unsaved task. The group's sequence assigns the ID.
    pub fn new(group_id: i64, name: impl Into<String>, cost_code: impl Into<String>) -> Self {
        Self {
            id: 0,
            group_id,
            name: name.into(),
            cost_code: cost_code.into(),
            used: TaskDuration::ZERO,
            running: None,
        }
    }

    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

/// Identifies the task currently considered active. Zero IDs mean none.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    #[serde(rename = "groupid")]
    pub group_id: i64,
    #[serde(rename = "taskid")]
    pub task_id: i64,
}

impl ActiveTask {
    pub const NONE: Self = Self {
        group_id: 0,
        task_id: 0,
    };

    pub const fn new(group_id: i64, task_id: i64) -> Self {
        Self { group_id, task_id }
    }

    pub const fn is_none(&self) -> bool {
        self.group_id == 0 && self.task_id == 0
    }
}

/// Reference to a recently used task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTask {
    pub id: i64,
    #[serde(rename = "groupid")]
    pub group_id: i64,
}

/// One contiguous interval of recorded work. An open slice has no end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Slice {
    pub const fn open(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub const fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of a closed slice; `None` while the slice is open.
    pub fn duration(&self) -> Option<TaskDuration> {
        self.end.map(|end| TaskDuration::between(self.start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn task_record_uses_stored_field_names() {
        let mut task = Task::new(3, "Review", "CC-100");
        task.id = 7;
        task.used = TaskDuration::from_secs(3723);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "groupid": 3,
                "name": "Review",
                "costcode": "CC-100",
                "duration": "1h2m3s",
            })
        );
    }

    #[test]
    fn task_record_keeps_running_timestamp() {
        let mut task = Task::new(1, "Write", "");
        task.running = Some(Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap());

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""running":"2024-01-01T23:00:00Z""#));

        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
        assert!(parsed.is_running());
    }

    #[test]
    fn task_record_rejects_missing_identity() {
        assert!(serde_json::from_str::<Task>(r#"{"name":"x"}"#).is_err());
        assert!(serde_json::from_str::<Task>(r#"{"id":1,"groupid":1,"name":"x","duration":"often"}"#).is_err());
    }

    #[test]
    fn active_task_zero_means_none() {
        assert!(ActiveTask::NONE.is_none());
        assert!(ActiveTask::default().is_none());
        assert!(!ActiveTask::new(1, 2).is_none());
        assert_eq!(
            serde_json::to_string(&ActiveTask::new(1, 2)).unwrap(),
            r#"{"groupid":1,"taskid":2}"#
        );
    }

    #[test]
    fn slice_duration_only_when_closed() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap();
        assert_eq!(Slice::open(start).duration(), None);
        assert_eq!(
            Slice::closed(start, end).duration(),
            Some(TaskDuration::from_mins(30))
        );
    }
}
