//! Usage report command.
//!
//! Renders a group's [`UsageReport`] as a table with one row per cost code
//! and one column per date, or as JSON.

use std::fmt::Write;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use sw_db::{Database, TaskDuration, UsageReport};

/// Width of each date and total column.
const COLUMN_WIDTH: usize = 10;

/// Dates covered when `--start` is omitted, counting the end date.
const DEFAULT_DAYS: i64 = 7;

/// Label for tasks without a cost code.
const NO_COST_CODE: &str = "(none)";

// ========== Text Output ==========

fn format_cell(used: TaskDuration) -> String {
    if used.is_zero() {
        "-".to_string()
    } else {
        used.to_string()
    }
}

fn format_row(label: &str, label_width: usize, cells: &[String]) -> String {
    let mut row = format!("{label:<label_width$}");
    for cell in cells {
        write!(row, "  {cell:>COLUMN_WIDTH$}").unwrap();
    }
    row
}

/// Formats a usage report as a human-readable table.
pub fn format_report(report: &UsageReport, group_name: &str, timezone: &str) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "Usage for {group_name}: {} to {} ({timezone})",
        report.start, report.end
    )
    .unwrap();
    writeln!(output).unwrap();

    if report.cost_codes.is_empty() {
        writeln!(output, "No time recorded in this period.").unwrap();
        return output;
    }

    let label_width = report
        .cost_codes
        .iter()
        .map(|usage| display_cost_code(&usage.cost_code).chars().count())
        .chain(["COST CODE".len()])
        .max()
        .unwrap_or(0);
    let rule = "─".repeat(label_width + (report.dates.len() + 1) * (COLUMN_WIDTH + 2));

    let mut header: Vec<String> = report.dates.iter().map(|d| d.date.to_string()).collect();
    header.push("TOTAL".to_string());
    writeln!(output, "{}", format_row("COST CODE", label_width, &header)).unwrap();
    writeln!(output, "{rule}").unwrap();

    for usage in &report.cost_codes {
        let mut cells: Vec<String> = usage.dates.iter().map(|d| format_cell(d.used)).collect();
        cells.push(format_cell(usage.total));
        let label = display_cost_code(&usage.cost_code);
        writeln!(output, "{}", format_row(label, label_width, &cells)).unwrap();
    }

    writeln!(output, "{rule}").unwrap();
    let mut totals: Vec<String> = report.dates.iter().map(|d| format_cell(d.used)).collect();
    totals.push(format_cell(report.total));
    writeln!(output, "{}", format_row("TOTAL", label_width, &totals)).unwrap();

    output
}

fn display_cost_code(cost_code: &str) -> &str {
    if cost_code.is_empty() {
        NO_COST_CODE
    } else {
        cost_code
    }
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub group: &'a str,
    pub timezone: &'a str,
    #[serde(flatten)]
    pub usage: &'a UsageReport,
}

/// Formats a usage report as JSON.
pub fn format_report_json(report: &UsageReport, group_name: &str, timezone: &str) -> Result<String> {
    let json = JsonReport {
        group: group_name,
        timezone,
        usage: report,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the report command.
///
/// Dates are calendar dates in the local timezone, or in UTC with `utc`.
/// Without dates the report covers the last week up to today.
pub fn run<W: std::io::Write>(
    writer: &mut W,
    db: &Database,
    group_id: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    utc: bool,
    json: bool,
) -> Result<()> {
    let group = db.get_group(group_id)?;

    let today = if utc {
        Utc::now().date_naive()
    } else {
        Local::now().date_naive()
    };
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| end - Duration::days(DEFAULT_DAYS - 1));

    let (report, timezone) = if utc {
        (db.get_usage_in(&Utc, group_id, start, end)?, "UTC".to_string())
    } else {
        let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "local".to_string());
        (db.get_usage(group_id, start, end)?, timezone)
    };

    if json {
        writeln!(writer, "{}", format_report_json(&report, &group.name, &timezone)?)?;
    } else {
        write!(writer, "{}", format_report(&report, &group.name, &timezone))?;
    }
    Ok(())
}
