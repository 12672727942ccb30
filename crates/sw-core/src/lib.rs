//! Core domain types for the stopwatch time tracker.
//!
//! This crate contains the storage-independent pieces of the tracker:
//! - Entities: groups, tasks, time slices and the active-task marker
//! - Durations: nanosecond counts with a compact `1h2m3s` text form
//! - Day splitting: cutting an interval at UTC calendar-day boundaries
//! - Usage reports: per-date and per-cost-code aggregation

pub mod duration;
mod split;
pub mod types;
pub mod usage;

pub use duration::{DurationParseError, TaskDuration};
pub use split::split_at_day_boundaries;
pub use types::{ActiveTask, Group, HistoryTask, Slice, Task};
pub use usage::{CostCodeUsage, DateUsage, UsageBuilder, UsageReport};
