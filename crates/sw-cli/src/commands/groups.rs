//! Group commands.

use std::io::Write;

use anyhow::{Result, bail};
use sw_db::Database;

pub fn add<W: Write>(writer: &mut W, db: &mut Database, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("group name must not be empty");
    }
    let group = db.add_group(name)?;
    writeln!(writer, "Added group {}: {}", group.id, group.name)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let groups = db.read_groups()?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&groups)?)?;
        return Ok(());
    }

    if groups.is_empty() {
        writeln!(writer, "No groups. Add one with 'sw group add <name>'.")?;
        return Ok(());
    }
    writeln!(writer, "{:>4}  Name", "ID")?;
    for group in groups {
        writeln!(writer, "{:>4}  {}", group.id, group.name)?;
    }
    Ok(())
}

pub fn rename<W: Write>(writer: &mut W, db: &mut Database, id: i64, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("group name must not be empty");
    }
    let mut group = db.get_group(id)?;
    group.name = name.to_string();
    db.save_group(&group)?;
    writeln!(writer, "Renamed group {}: {}", group.id, group.name)?;
    Ok(())
}
