//! Slice listing and editing commands.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sw_db::keys::encode_time;
use sw_db::{Database, Slice};

/// Default lookback when listing slices without `--start`.
const DEFAULT_LOOKBACK_DAYS: i64 = 7;

pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    group_id: i64,
    task_id: i64,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    json: bool,
) -> Result<()> {
    let now = Utc::now();
    let start = start.unwrap_or_else(|| now - Duration::days(DEFAULT_LOOKBACK_DAYS));
    let end = end.unwrap_or_else(|| now + Duration::days(1));
    let slices = db.get_slices(group_id, task_id, start, end)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&slices)?)?;
        return Ok(());
    }
    write!(writer, "{}", format_slices(&slices))?;
    Ok(())
}

pub fn set<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: i64,
    task_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<()> {
    let task = db.set_slice(group_id, task_id, start, end)?;
    writeln!(
        writer,
        "Set slice {} to {} for {}/{} {} ({} total)",
        encode_time(start),
        encode_time(end),
        task.group_id,
        task.id,
        task.name,
        task.used
    )?;
    Ok(())
}

pub fn remove<W: Write>(
    writer: &mut W,
    db: &mut Database,
    group_id: i64,
    task_id: i64,
    start: DateTime<Utc>,
) -> Result<()> {
    let task = db.remove_slice(group_id, task_id, start)?;
    writeln!(
        writer,
        "Removed slice {} from {}/{} {} ({} total)",
        encode_time(start),
        task.group_id,
        task.id,
        task.name,
        task.used
    )?;
    Ok(())
}

fn format_slices(slices: &[Slice]) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    if slices.is_empty() {
        writeln!(output, "No slices in this period.").unwrap();
        return output;
    }

    writeln!(output, "{:<20}  {:<20}  {:>10}", "START", "END", "DURATION").unwrap();
    for slice in slices {
        let end = slice.end.map_or_else(|| "(running)".to_string(), encode_time);
        let duration = slice.duration().map(|d| d.to_string()).unwrap_or_default();
        let line = format!("{:<20}  {:<20}  {:>10}", encode_time(slice.start), end, duration);
        writeln!(output, "{}", line.trim_end()).unwrap();
    }
    output
}
