//! Recently used tasks.

use std::io::Write;

use anyhow::Result;
use sw_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let tasks = db.read_history()?;
    if tasks.is_empty() {
        writeln!(writer, "No recent tasks.")?;
        return Ok(());
    }
    for task in tasks {
        let marker = if task.is_running() { " (running)" } else { "" };
        writeln!(writer, "{}/{} {}{marker}", task.group_id, task.id, task.name)?;
    }
    Ok(())
}
