//! Usage reporting: time per date and cost code for a group.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use sw_core::{TaskDuration, UsageBuilder, UsageReport};

use crate::entities::read_group_tasks;
use crate::keys::{decode_time, encode_time};
use crate::ledger::slice_bucket;
use crate::{Database, DbError};

impl Database {
    /// Reports a group's usage for the local calendar dates `start..=end`.
    pub fn get_usage(
        &self,
        group_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UsageReport, DbError> {
        self.get_usage_in(&Local, group_id, start, end)
    }

    /// Reports a group's usage for calendar dates `start..=end` in `tz`.
    ///
    /// The window runs from 00:00:00 on `start` to 23:59:59 on `end`. Slices
    /// are included by start time (a slice starting exactly at the window end
    /// is excluded) and booked on the date they start, under their task's
    /// cost code. Open slices are ignored.
    pub fn get_usage_in<Tz: TimeZone>(
        &self,
        tz: &Tz,
        group_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UsageReport, DbError> {
        let window_start = local_midnight_to_utc(tz, start);
        let window_end = end
            .succ_opt()
            .map(|next| local_midnight_to_utc(tz, next) - TimeDelta::seconds(1))
            .ok_or_else(|| DbError::invalid_range(start, end))?;
        if window_start >= window_end {
            return Err(DbError::invalid_range(start, end));
        }

        let min = encode_time(window_start);
        let max = encode_time(window_end);
        let mut builder = UsageBuilder::new(group_id, start, end);

        self.view(|conn| {
            for task in read_group_tasks(conn, group_id)? {
                let slices = match slice_bucket(conn, group_id, task.id) {
                    Ok(slices) => slices,
                    Err(err) if err.is_not_found() => {
                        tracing::warn!(group = group_id, task = task.id, name = %task.name, "no slices for task");
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                for (key, value) in slices.range(min.as_bytes(), max.as_bytes())? {
                    if value.is_empty() {
                        continue;
                    }
                    let (Some(started), Some(ended)) = (decode_time(&key), decode_time(&value))
                    else {
                        tracing::warn!(
                            group = group_id,
                            task = task.id,
                            key = %String::from_utf8_lossy(&key),
                            "skipping unreadable slice"
                        );
                        continue;
                    };
                    let date = started.with_timezone(tz).date_naive();
                    builder.record(&task.cost_code, date, TaskDuration::between(started, ended));
                }
            }
            Ok(())
        })?;

        let report = builder.finish();
        tracing::debug!(group = group_id, %start, %end, total = %report.total, "usage computed");
        Ok(report)
    }
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            // DST spring-forward gap at midnight: 1am local exists
            let one_am = midnight + TimeDelta::hours(1);
            tz.from_local_datetime(&one_am)
                .earliest()
                .map_or_else(|| one_am.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}
