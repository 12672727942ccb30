//! Task commands.

use std::io::Write;

use anyhow::{Result, bail};
use sw_db::keys::encode_time;
use sw_db::{Database, Task};

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: i64,
    name: &str,
    cost_code: &str,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("task name must not be empty");
    }
    let task = db.add_task(group_id, name, cost_code.trim())?;
    writeln!(writer, "Added task {}/{}: {}", task.group_id, task.id, task.name)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, group_id: i64, json: bool) -> Result<()> {
    // Surface a missing group instead of printing an empty list.
    let group = db.get_group(group_id)?;
    let tasks = db.read_tasks(group_id)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&tasks)?)?;
        return Ok(());
    }

    if tasks.is_empty() {
        writeln!(writer, "No tasks in {}.", group.name)?;
        return Ok(());
    }

    let name_width = tasks.iter().map(|t| t.name.chars().count()).max().unwrap_or(0).max(4);
    let code_width = tasks
        .iter()
        .map(|t| t.cost_code.chars().count())
        .max()
        .unwrap_or(0)
        .max(9);
    let header = format!(
        "{:>4}  {:<name_width$}  {:<code_width$}  {:>12}  Status",
        "ID", "Name", "Cost code", "Used"
    );
    writeln!(writer, "{}", header.trim_end())?;
    for task in &tasks {
        let status = if task.is_running() { "running" } else { "" };
        let line = format!(
            "{:>4}  {:<name_width$}  {:<code_width$}  {:>12}  {status}",
            task.id,
            task.name,
            task.cost_code,
            task.used.to_string(),
        );
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}

pub fn show<W: Write>(writer: &mut W, db: &Database, group_id: i64, task_id: i64) -> Result<()> {
    let group = db.get_group(group_id)?;
    let task = db.get_task(group_id, task_id)?;
    write_task(writer, &group.name, &task)
}

pub fn update<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: i64,
    task_id: i64,
    name: Option<&str>,
    cost_code: Option<&str>,
) -> Result<()> {
    if name.is_none() && cost_code.is_none() {
        bail!("nothing to update: pass --name or --cost-code");
    }
    let mut task = db.get_task(group_id, task_id)?;
    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            bail!("task name must not be empty");
        }
        task.name = name.to_string();
    }
    if let Some(cost_code) = cost_code {
        task.cost_code = cost_code.trim().to_string();
    }
    db.save_task(&task)?;
    writeln!(writer, "Updated task {}/{}: {}", task.group_id, task.id, task.name)?;
    Ok(())
}

fn write_task<W: Write>(writer: &mut W, group_name: &str, task: &Task) -> Result<()> {
    writeln!(writer, "Task:      {}/{} {}", task.group_id, task.id, task.name)?;
    writeln!(writer, "Group:     {group_name}")?;
    let cost_code = if task.cost_code.is_empty() {
        "(none)"
    } else {
        &task.cost_code
    };
    writeln!(writer, "Cost code: {cost_code}")?;
    writeln!(writer, "Used:      {}", task.used)?;
    match task.running {
        Some(since) => writeln!(writer, "Running:   since {}", encode_time(since))?,
        None => writeln!(writer, "Running:   no")?,
    }
    Ok(())
}
