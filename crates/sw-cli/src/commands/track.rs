//! Start, stop and active-task commands.
//!
//! Only one task runs at a time from the CLI's point of view: starting a task
//! stops the previously active one and marks the new one active.

use std::io::Write;

use anyhow::{Result, bail};
use sw_db::keys::encode_time;
use sw_db::{Database, DbError, HistoryTask, Task};

/// Starts a task, stopping a different running active task first.
///
/// The task moves to the front of a history list of at most `history_limit`
/// entries.
pub fn start<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: i64,
    task_id: i64,
    history_limit: usize,
) -> Result<()> {
    let task = db.get_task(group_id, task_id)?;

    if let Some(previous) = active_task(db)? {
        let same = previous.group_id == group_id && previous.id == task_id;
        if !same && previous.is_running() {
            let stopped = db.stop_task(previous.group_id, previous.id)?;
            writeln!(writer, "Stopped {} ({} total)", label(&stopped), stopped.used)?;
        }
    }

    let was_running = task.is_running();
    let task = db.start_task(group_id, task_id)?;
    db.set_active_task(group_id, task_id)?;
    remember(db, &task, history_limit)?;

    let since = task.running.map(encode_time).unwrap_or_default();
    if was_running {
        writeln!(writer, "{} already running since {since}", label(&task))?;
    } else {
        writeln!(writer, "Started {} at {since}", label(&task))?;
    }
    Ok(())
}

pub fn stop<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: Option<i64>,
    task_id: Option<i64>,
) -> Result<()> {
    let (group_id, task_id) = match (group_id, task_id) {
        (Some(group_id), Some(task_id)) => (group_id, task_id),
        (None, None) => match active_task(db)? {
            Some(task) => (task.group_id, task.id),
            None => bail!("no active task. Pass a group and task ID to stop"),
        },
        _ => bail!("pass both a group and a task ID, or neither to stop the active task"),
    };

    let task = db.stop_task(group_id, task_id)?;
    if active_task(db)?.is_some_and(|active| active.group_id == group_id && active.id == task_id) {
        db.clear_active_task()?;
    }
    writeln!(writer, "Stopped {} ({} total)", label(&task), task.used)?;
    Ok(())
}

pub fn active<W: Write>(writer: &mut W, db: &mut Database, clear: bool) -> Result<()> {
    if clear {
        db.clear_active_task()?;
        writeln!(writer, "Active task cleared.")?;
        return Ok(());
    }

    match active_task(db)? {
        Some(task) => {
            let state = match task.running {
                Some(since) => format!("running since {}", encode_time(since)),
                None => "stopped".to_string(),
            };
            writeln!(writer, "{} ({state}, {} used)", label(&task), task.used)?;
        }
        None => writeln!(writer, "No active task.")?,
    }
    Ok(())
}

/// Reads the active task, treating a marker whose task is gone as unset.
fn active_task(db: &Database) -> Result<Option<Task>, DbError> {
    match db.get_active_task() {
        Ok(task) => Ok(task),
        Err(err) if err.is_not_found() => {
            tracing::warn!(error = %err, "active task no longer exists");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Moves `task` to the front of the history list.
fn remember(db: &mut Database, task: &Task, limit: usize) -> Result<(), DbError> {
    let mut history = vec![HistoryTask {
        id: task.id,
        group_id: task.group_id,
    }];
    history.extend(
        db.read_history()?
            .into_iter()
            .filter(|t| !(t.group_id == task.group_id && t.id == task.id))
            .map(|t| HistoryTask {
                id: t.id,
                group_id: t.group_id,
            }),
    );
    history.truncate(limit);
    db.save_history(&history)
}

fn label(task: &Task) -> String {
    format!("{}/{} {}", task.group_id, task.id, task.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.add_group("Client A").unwrap();
        db.add_task(1, "Design", "CC-1").unwrap();
        db.add_task(1, "Review", "CC-2").unwrap();
        db
    }

    fn run_start(db: &mut Database, task_id: i64) -> String {
        let mut output = Vec::new();
        start(&mut output, db, 1, task_id, 10).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn start_marks_task_active_and_running() {
        let mut db = setup();
        let output = run_start(&mut db, 1);

        assert!(output.starts_with("Started 1/1 Design at "));
        let active = db.get_active_task().unwrap().unwrap();
        assert_eq!(active.id, 1);
        assert!(active.is_running());
    }

    #[test]
    fn starting_again_reports_already_running() {
        let mut db = setup();
        run_start(&mut db, 1);
        let output = run_start(&mut db, 1);
        assert!(output.starts_with("1/1 Design already running since "));
    }

    #[test]
    fn start_switches_from_previous_active_task() {
        let mut db = setup();
        run_start(&mut db, 1);
        let output = run_start(&mut db, 2);

        assert!(output.starts_with("Stopped 1/1 Design"));
        assert!(!db.get_task(1, 1).unwrap().is_running());
        assert!(db.get_task(1, 2).unwrap().is_running());
        assert_eq!(db.get_active_task().unwrap().unwrap().id, 2);
    }

    #[test]
    fn start_records_history_most_recent_first() {
        let mut db = setup();
        run_start(&mut db, 1);
        run_start(&mut db, 2);
        run_start(&mut db, 1);

        let ids: Vec<i64> = db.read_history().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn history_is_capped_at_limit() {
        let mut db = setup();
        let mut output = Vec::new();
        start(&mut output, &mut db, 1, 1, 1).unwrap();
        start(&mut output, &mut db, 1, 2, 1).unwrap();

        let ids: Vec<i64> = db.read_history().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn stop_without_arguments_stops_active_task() {
        let mut db = setup();
        run_start(&mut db, 2);
        let mut output = Vec::new();
        stop(&mut output, &mut db, None, None).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Stopped 1/2 Review"));
        assert!(!db.get_task(1, 2).unwrap().is_running());
        assert!(db.get_active_task().unwrap().is_none());
    }

    #[test]
    fn stop_other_task_keeps_active_marker() {
        let mut db = setup();
        run_start(&mut db, 2);
        db.start_task(1, 1).unwrap();

        let mut output = Vec::new();
        stop(&mut output, &mut db, Some(1), Some(1)).unwrap();
        assert_eq!(db.get_active_task().unwrap().unwrap().id, 2);
    }

    #[test]
    fn stop_with_nothing_active_fails() {
        let mut db = setup();
        let mut output = Vec::new();
        let err = stop(&mut output, &mut db, None, None).unwrap_err();
        assert!(err.to_string().contains("no active task"));
        assert!(stop(&mut output, &mut db, Some(1), None).is_err());
    }

    #[test]
    fn active_reports_and_clears() {
        let mut db = setup();
        let mut output = Vec::new();
        active(&mut output, &mut db, false).unwrap();
        db.set_active_task(1, 1).unwrap();
        active(&mut output, &mut db, false).unwrap();
        active(&mut output, &mut db, true).unwrap();
        active(&mut output, &mut db, false).unwrap();

        insta::assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        No active task.
        1/1 Design (stopped, 0s used)
        Active task cleared.
        No active task.
        ");
    }

    #[test]
    fn dangling_marker_reads_as_no_active_task() {
        let mut db = setup();
        db.set_active_task(1, 42).unwrap();
        let mut output = Vec::new();
        active(&mut output, &mut db, false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No active task.\n");
    }
}
