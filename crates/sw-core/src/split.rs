use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Splits `[start, end]` into pieces that never cross a UTC calendar day.
///
/// Every piece but the last ends at 23:59:59 of its day; the following piece
/// starts at 00:00:00 of the next day. The last piece ends at `end`. An
/// interval within a single day comes back unchanged.
pub fn split_at_day_boundaries(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut pieces = Vec::new();
    let mut from = start;

    while from < end && from.date_naive() != end.date_naive() {
        let Some(next_day) = from.date_naive().succ_opt() else {
            break;
        };
        let next_midnight = next_day.and_time(NaiveTime::MIN).and_utc();
        pieces.push((from, next_midnight - TimeDelta::seconds(1)));
        from = next_midnight;
    }

    pieces.push((from, end));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn at(day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, min, sec).unwrap()
    }

    #[test]
    fn same_day_interval_is_untouched() {
        let pieces = split_at_day_boundaries(at(1, 9, 0, 0), at(1, 17, 30, 0));
        assert_eq!(pieces, vec![(at(1, 9, 0, 0), at(1, 17, 30, 0))]);
    }

    #[test]
    fn overnight_interval_splits_at_midnight() {
        let pieces = split_at_day_boundaries(at(1, 23, 0, 0), at(2, 1, 0, 0));
        assert_eq!(
            pieces,
            vec![
                (at(1, 23, 0, 0), at(1, 23, 59, 59)),
                (at(2, 0, 0, 0), at(2, 1, 0, 0)),
            ]
        );
    }

    #[test]
    fn multi_day_interval_gets_whole_day_pieces() {
        let pieces = split_at_day_boundaries(at(1, 22, 0, 0), at(4, 2, 15, 0));
        assert_eq!(
            pieces,
            vec![
                (at(1, 22, 0, 0), at(1, 23, 59, 59)),
                (at(2, 0, 0, 0), at(2, 23, 59, 59)),
                (at(3, 0, 0, 0), at(3, 23, 59, 59)),
                (at(4, 0, 0, 0), at(4, 2, 15, 0)),
            ]
        );
    }

    #[test]
    fn interval_ending_at_midnight_keeps_zero_length_tail() {
        let pieces = split_at_day_boundaries(at(1, 23, 0, 0), at(2, 0, 0, 0));
        assert_eq!(
            pieces,
            vec![
                (at(1, 23, 0, 0), at(1, 23, 59, 59)),
                (at(2, 0, 0, 0), at(2, 0, 0, 0)),
            ]
        );
    }
}
