//! Usage reports: time per date and per cost code for one group.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::TaskDuration;

/// Time used on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateUsage {
    pub date: NaiveDate,
    pub used: TaskDuration,
}

/// Time booked under one cost code, broken down by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCodeUsage {
    pub cost_code: String,
    pub dates: Vec<DateUsage>,
    pub total: TaskDuration,
}

/// Usage of a group over an inclusive date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    pub group_id: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Every date in the window, summed across cost codes.
    pub dates: Vec<DateUsage>,
    /// Cost codes with recorded time, ordered by name.
    pub cost_codes: Vec<CostCodeUsage>,
    pub total: TaskDuration,
}

/// Accumulates slice durations into a [`UsageReport`].
#[derive(Debug)]
pub struct UsageBuilder {
    group_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    dates: Vec<NaiveDate>,
    daily: BTreeMap<String, BTreeMap<NaiveDate, TaskDuration>>,
    totals: BTreeMap<String, TaskDuration>,
    total: TaskDuration,
}

impl UsageBuilder {
    /// Starts a report covering `start..=end`.
    pub fn new(group_id: i64, start: NaiveDate, end: NaiveDate) -> Self {
        let dates = start.iter_days().take_while(|date| *date <= end).collect();
        Self {
            group_id,
            start,
            end,
            dates,
            daily: BTreeMap::new(),
            totals: BTreeMap::new(),
            total: TaskDuration::ZERO,
        }
    }

    /// Books `used` on `date` under `cost_code`.
    ///
    /// A cost code seen for the first time gets a zero entry for every date
    /// in the window. Dates outside the window only count toward totals.
    pub fn record(&mut self, cost_code: &str, date: NaiveDate, used: TaskDuration) {
        let dates = &self.dates;
        let daily = self
            .daily
            .entry(cost_code.to_string())
            .or_insert_with(|| dates.iter().map(|d| (*d, TaskDuration::ZERO)).collect());
        if let Some(slot) = daily.get_mut(&date) {
            *slot += used;
        }
        *self.totals.entry(cost_code.to_string()).or_default() += used;
        self.total += used;
    }

    /// Finishes the report, dropping cost codes with no time in the window.
    pub fn finish(self) -> UsageReport {
        let dates = self
            .dates
            .iter()
            .map(|date| DateUsage {
                date: *date,
                used: self
                    .daily
                    .values()
                    .filter_map(|daily| daily.get(date).copied())
                    .sum(),
            })
            .collect();

        let cost_codes = self
            .daily
            .into_iter()
            .filter_map(|(cost_code, daily)| {
                let total = self.totals.get(&cost_code).copied().unwrap_or_default();
                if total.is_zero() {
                    return None;
                }
                Some(CostCodeUsage {
                    cost_code,
                    dates: daily
                        .into_iter()
                        .map(|(date, used)| DateUsage { date, used })
                        .collect(),
                    total,
                })
            })
            .collect();

        UsageReport {
            group_id: self.group_id,
            start: self.start,
            end: self.end,
            dates,
            cost_codes,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn empty_window_lists_every_date() {
        let report = UsageBuilder::new(1, day(1), day(3)).finish();
        assert_eq!(
            report.dates.iter().map(|d| d.date).collect::<Vec<_>>(),
            vec![day(1), day(2), day(3)]
        );
        assert!(report.dates.iter().all(|d| d.used.is_zero()));
        assert!(report.cost_codes.is_empty());
        assert_eq!(report.total, TaskDuration::ZERO);
    }

    #[test]
    fn aggregates_per_date_and_cost_code() {
        let mut builder = UsageBuilder::new(1, day(1), day(3));
        builder.record("DEV", day(1), TaskDuration::from_hours(2));
        builder.record("DEV", day(3), TaskDuration::from_mins(30));
        builder.record("OPS", day(1), TaskDuration::from_mins(45));
        let report = builder.finish();

        assert_eq!(report.total, TaskDuration::from_mins(195));
        assert_eq!(report.dates[0].used, TaskDuration::from_mins(165));
        assert_eq!(report.dates[1].used, TaskDuration::ZERO);
        assert_eq!(report.dates[2].used, TaskDuration::from_mins(30));

        assert_eq!(report.cost_codes.len(), 2);
        let dev = &report.cost_codes[0];
        assert_eq!(dev.cost_code, "DEV");
        assert_eq!(dev.total, TaskDuration::from_mins(150));
        assert_eq!(dev.dates.len(), 3);
        assert_eq!(dev.dates[1].used, TaskDuration::ZERO);
        assert_eq!(report.cost_codes[1].cost_code, "OPS");
    }

    #[test]
    fn zero_total_cost_codes_are_dropped() {
        let mut builder = UsageBuilder::new(1, day(1), day(2));
        builder.record("IDLE", day(1), TaskDuration::ZERO);
        builder.record("DEV", day(2), TaskDuration::from_mins(10));
        let report = builder.finish();

        assert_eq!(report.cost_codes.len(), 1);
        assert_eq!(report.cost_codes[0].cost_code, "DEV");
    }

    #[test]
    fn dates_outside_window_count_only_in_totals() {
        let mut builder = UsageBuilder::new(1, day(2), day(2));
        builder.record("DEV", day(5), TaskDuration::from_mins(10));
        let report = builder.finish();

        assert_eq!(report.dates[0].used, TaskDuration::ZERO);
        assert_eq!(report.cost_codes[0].total, TaskDuration::from_mins(10));
        assert_eq!(report.total, TaskDuration::from_mins(10));
    }

    #[test]
    fn report_serializes_durations_as_text() {
        let mut builder = UsageBuilder::new(1, day(1), day(2));
        builder.record("DEV", day(2), TaskDuration::from_mins(90));
        let json = serde_json::to_string_pretty(&builder.finish()).unwrap();

        insta::assert_snapshot!(json, @r#"
        {
          "group_id": 1,
          "start": "2024-01-01",
          "end": "2024-01-02",
          "dates": [
            {
              "date": "2024-01-01",
              "used": "0s"
            },
            {
              "date": "2024-01-02",
              "used": "1h30m0s"
            }
          ],
          "cost_codes": [
            {
              "cost_code": "DEV",
              "dates": [
                {
                  "date": "2024-01-01",
                  "used": "0s"
                },
                {
                  "date": "2024-01-02",
                  "used": "1h30m0s"
                }
              ],
              "total": "1h30m0s"
            }
          ],
          "total": "1h30m0s"
        }
        "#);
    }
}
