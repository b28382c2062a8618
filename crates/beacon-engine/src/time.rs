use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Aggregation window boundaries, computed once per call against a single
/// `now` so every metric in a snapshot shares the same clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatWindows {
    /// Local midnight of the current day, in UTC.
    pub today_start: DateTime<Utc>,
    /// Seven days before `now`.
    pub week_start: DateTime<Utc>,
}

impl StatWindows {
    pub fn at(now: DateTime<Utc>) -> Self {
        let local_midnight = now.with_timezone(&Local).date_naive().and_time(NaiveTime::MIN);
        Self {
            today_start: local_to_utc(local_midnight),
            week_start: now - Duration::days(7),
        }
    }
}

/// Interpret a local wall-clock time as a UTC instant.
///
/// DST folds resolve to the earlier instant; times inside a DST gap fall
/// back to a plain UTC reading.
pub fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(instant) => instant.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

/// Half-open UTC range covering the inclusive local-day span `start..=end`.
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = local_to_utc(start.and_time(NaiveTime::MIN));
    let to = local_to_utc(end.succ_opt().unwrap_or(end).and_time(NaiveTime::MIN));
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_share_one_clock_reading() {
        let now = Utc::now();
        let windows = StatWindows::at(now);

        assert!(windows.today_start <= now);
        assert!(now - windows.today_start < Duration::days(1) + Duration::hours(1));
        assert_eq!(windows.week_start, now - Duration::days(7));
    }

    #[test]
    fn test_day_bounds_cover_full_days() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let (from, to) = day_bounds(start, end);

        // Three inclusive local days, regardless of the host timezone.
        assert_eq!(to - from, Duration::days(3));
    }

    #[test]
    fn test_single_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let (from, to) = day_bounds(day, day);
        assert_eq!(to - from, Duration::days(1));
    }
}
