//! Task durations.
//!
//! A [`TaskDuration`] is a signed nanosecond count. Its text form is the
//! compact unit notation used in stored task records and reports:
//! `1h2m3s`, `45m0s`, `1.5s`, `250ms`, `0s`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One `<number><unit>` component, e.g. `12m` or `1.5s`.
static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").unwrap()
});

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Errors from parsing a duration string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    /// The input was empty.
    #[error("empty duration")]
    Empty,

    /// The input did not follow `<number><unit>...` notation.
    #[error("invalid duration: {0:?}")]
    Invalid(String),

    /// The value does not fit in a signed 64-bit nanosecond count.
    #[error("duration out of range: {0:?}")]
    OutOfRange(String),
}

/// Time spent on a task, in nanoseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskDuration(i64);

impl TaskDuration {
    pub const ZERO: Self = Self(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    pub const fn from_mins(mins: i64) -> Self {
        Self::from_secs(mins.saturating_mul(60))
    }

    pub const fn from_hours(hours: i64) -> Self {
        Self::from_secs(hours.saturating_mul(3600))
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converts a chrono delta, saturating at the `i64` nanosecond limits.
    pub fn from_delta(delta: TimeDelta) -> Self {
        delta.num_nanoseconds().map_or_else(
            || {
                if delta < TimeDelta::zero() {
                    Self(i64::MIN)
                } else {
                    Self(i64::MAX)
                }
            },
            Self,
        )
    }

    /// Elapsed time from `start` to `end` (negative if `end` is earlier).
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_delta(end.signed_duration_since(start))
    }
}

impl Add for TaskDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TaskDuration {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for TaskDuration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for TaskDuration {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for TaskDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for TaskDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let nanos = u128::from(self.0.unsigned_abs());

        if nanos < NANOS_PER_MICRO {
            return write!(f, "{nanos}ns");
        }
        if nanos < NANOS_PER_MILLI {
            return write!(f, "{}µs", decimal(nanos, NANOS_PER_MICRO));
        }
        if nanos < NANOS_PER_SECOND {
            return write!(f, "{}ms", decimal(nanos, NANOS_PER_MILLI));
        }

        let hours = nanos / NANOS_PER_HOUR;
        let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
        let seconds = decimal(nanos % NANOS_PER_MINUTE, NANOS_PER_SECOND);
        if hours > 0 {
            write!(f, "{hours}h{minutes}m{seconds}s")
        } else if minutes > 0 {
            write!(f, "{minutes}m{seconds}s")
        } else {
            write!(f, "{seconds}s")
        }
    }
}

/// Renders `value / unit` with trailing fractional zeros removed.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

impl FromStr for TaskDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, mut rest) = match s.as_bytes().first() {
            None => return Err(DurationParseError::Empty),
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
        };
        if rest == "0" {
            return Ok(Self::ZERO);
        }
        if rest.is_empty() {
            return Err(DurationParseError::Invalid(s.to_string()));
        }

        let mut total: u128 = 0;
        while !rest.is_empty() {
            let Some(caps) = COMPONENT_RE.captures(rest) else {
                return Err(DurationParseError::Invalid(s.to_string()));
            };
            let unit = match &caps[2] {
                "ns" => 1,
                "us" | "µs" | "μs" => NANOS_PER_MICRO,
                "ms" => NANOS_PER_MILLI,
                "s" => NANOS_PER_SECOND,
                "m" => NANOS_PER_MINUTE,
                _ => NANOS_PER_HOUR,
            };
            let component = component_nanos(&caps[1], unit)
                .ok_or_else(|| DurationParseError::OutOfRange(s.to_string()))?;
            total = total
                .checked_add(component)
                .ok_or_else(|| DurationParseError::OutOfRange(s.to_string()))?;
            rest = &rest[caps[0].len()..];
        }

        let magnitude =
            i128::try_from(total).map_err(|_| DurationParseError::OutOfRange(s.to_string()))?;
        let signed = if negative { -magnitude } else { magnitude };
        i64::try_from(signed)
            .map(Self)
            .map_err(|_| DurationParseError::OutOfRange(s.to_string()))
    }
}

/// Converts a decimal number of `unit`s to nanoseconds. Digits beyond
/// nanosecond precision are dropped.
fn component_nanos(number: &str, unit: u128) -> Option<u128> {
    let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit)?;

    let frac = &frac[..frac.len().min(18)];
    if !frac.is_empty() {
        let scale = 10u128.pow(u32::try_from(frac.len()).ok()?);
        let frac: u128 = frac.parse().ok()?;
        nanos = nanos.checked_add(frac * unit / scale)?;
    }
    Some(nanos)
}

impl From<TaskDuration> for String {
    fn from(duration: TaskDuration) -> Self {
        duration.to_string()
    }
}

impl TryFrom<String> for TaskDuration {
    type Error = DurationParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
