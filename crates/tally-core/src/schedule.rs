//! Occurrence arithmetic for periodic templates.
//!
//! Steps are taken on the local calendar of a configurable timezone, so a
//! daily template stays at the same wall-clock time across DST changes.
//! Month steps clamp to the last day of the target month (Jan 31 + 1 month
//! is Feb 28 or 29); the next step then starts from the clamped day.
//! A local time skipped by a spring-forward jump moves one hour later, and
//! that shifted time carries forward the same way: a daily 02:30 template
//! in New York runs at 03:30 from the jump onwards.

use crate::error::CoreError;
use crate::models::RepeatUnit;
use chrono::{DateTime, Days, LocalResult, Months, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const SECONDS_PER_DAY: i64 = 86_400;

/// Next occurrence after `current` on the UTC calendar.
pub fn next_occurrence(current: i64, interval: u32, unit: RepeatUnit) -> i64 {
    ScheduleCalculator::utc().next_occurrence(current, interval, unit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleCalculator {
    timezone: Tz,
}

impl Default for ScheduleCalculator {
    fn default() -> Self {
        Self::utc()
    }
}

impl ScheduleCalculator {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Builds a calculator from an IANA timezone name.
    pub fn from_timezone_name(name: &str) -> Result<Self, CoreError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| CoreError::InvalidTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Computes the occurrence that follows `current`.
    ///
    /// The result is always strictly greater than `current`. An interval of 0
    /// is treated as 1. If calendar arithmetic overflows, a fixed-length step
    /// is used instead so callers iterating on the cursor always progress.
    pub fn next_occurrence(&self, current: i64, interval: u32, unit: RepeatUnit) -> i64 {
        let interval = interval.max(1);
        match self.calendar_step(current, interval, unit) {
            Some(next) if next > current => next,
            _ => {
                tracing::warn!(
                    current,
                    interval,
                    unit = %unit,
                    "calendar step did not advance, using fixed-length step"
                );
                current
                    .saturating_add(fixed_step(interval, unit))
                    .max(current.saturating_add(1))
            }
        }
    }

    /// Upcoming occurrences starting at `from` (inclusive), at most `count`,
    /// none later than `end_date`.
    pub fn preview(
        &self,
        from: i64,
        interval: u32,
        unit: RepeatUnit,
        end_date: Option<i64>,
        count: usize,
    ) -> Vec<i64> {
        let mut result = Vec::with_capacity(count.min(1000));
        let mut cursor = from;
        while result.len() < count {
            if end_date.is_some_and(|end| cursor > end) {
                break;
            }
            result.push(cursor);
            cursor = self.next_occurrence(cursor, interval, unit);
        }
        result
    }

    fn calendar_step(&self, current: i64, interval: u32, unit: RepeatUnit) -> Option<i64> {
        let local = DateTime::<Utc>::from_timestamp(current, 0)?
            .with_timezone(&self.timezone)
            .naive_local();

        let target = match unit {
            RepeatUnit::Day => local.checked_add_days(Days::new(u64::from(interval)))?,
            RepeatUnit::Week => local.checked_add_days(Days::new(u64::from(interval) * 7))?,
            RepeatUnit::Month => local.checked_add_months(Months::new(interval))?,
            RepeatUnit::Year => local.checked_add_months(Months::new(interval.checked_mul(12)?))?,
        };

        self.resolve_local(target).map(|dt| dt.timestamp())
    }

    /// Maps a local wall-clock time back to an instant.
    ///
    /// Ambiguous times (DST fall back) take the earliest instant; times
    /// skipped by a spring-forward jump move one hour later.
    fn resolve_local(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => {
                let shifted = naive.checked_add_signed(chrono::Duration::hours(1))?;
                self.timezone.from_local_datetime(&shifted).earliest()
            }
        }
    }
}

fn fixed_step(interval: u32, unit: RepeatUnit) -> i64 {
    let days = match unit {
        RepeatUnit::Day => 1,
        RepeatUnit::Week => 7,
        RepeatUnit::Month => 30,
        RepeatUnit::Year => 365,
    };
    i64::from(interval)
        .saturating_mul(days)
        .saturating_mul(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp()
    }

    mod calendar_rules {
        use super::*;

        #[test]
        fn test_day_and_week_steps() {
            let start = utc(2024, 1, 1);
            assert_eq!(next_occurrence(start, 1, RepeatUnit::Day), utc(2024, 1, 2));
            assert_eq!(next_occurrence(start, 10, RepeatUnit::Day), utc(2024, 1, 11));
            assert_eq!(next_occurrence(start, 1, RepeatUnit::Week), utc(2024, 1, 8));
            assert_eq!(next_occurrence(start, 3, RepeatUnit::Week), utc(2024, 1, 22));
        }

        #[test]
        fn test_month_end_clamps_in_leap_year() {
            let jan31 = utc(2024, 1, 31);
            let second = next_occurrence(jan31, 1, RepeatUnit::Month);
            assert_eq!(second, utc(2024, 2, 29));
            // The clamped day carries forward.
            assert_eq!(next_occurrence(second, 1, RepeatUnit::Month), utc(2024, 3, 29));
        }

        #[test]
        fn test_month_end_clamps_in_common_year() {
            let jan31 = utc(2023, 1, 31);
            assert_eq!(next_occurrence(jan31, 1, RepeatUnit::Month), utc(2023, 2, 28));
            assert_eq!(next_occurrence(jan31, 2, RepeatUnit::Month), utc(2023, 3, 31));
        }

        #[test]
        fn test_month_rollover_is_deterministic() {
            let jan31 = utc(2024, 1, 31);
            let first = next_occurrence(jan31, 1, RepeatUnit::Month);
            for _ in 0..5 {
                assert_eq!(next_occurrence(jan31, 1, RepeatUnit::Month), first);
            }
        }

        #[test]
        fn test_year_step_from_leap_day() {
            let leap_day = utc(2024, 2, 29);
            assert_eq!(next_occurrence(leap_day, 1, RepeatUnit::Year), utc(2025, 2, 28));
            assert_eq!(next_occurrence(leap_day, 4, RepeatUnit::Year), utc(2028, 2, 29));
        }

        #[test]
        fn test_zero_interval_treated_as_one() {
            let start = utc(2024, 5, 1);
            assert_eq!(next_occurrence(start, 0, RepeatUnit::Day), utc(2024, 5, 2));
        }

        #[test]
        fn test_overflow_still_advances() {
            let near_max = i64::MAX - 10;
            assert!(next_occurrence(near_max, 1, RepeatUnit::Day) > near_max);
        }
    }

    mod timezone_rules {
        use super::*;

        #[test]
        fn test_daily_step_keeps_wall_clock_across_spring_forward() {
            let calc = ScheduleCalculator::new(New_York);
            let before = New_York.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
            let next = calc.next_occurrence(before.timestamp(), 1, RepeatUnit::Day);
            let expected = New_York.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
            assert_eq!(next, expected.timestamp());
            // Only 23 hours elapsed.
            assert_eq!(next - before.timestamp(), 23 * 3600);
        }

        #[test]
        fn test_skipped_local_time_moves_forward_one_hour() {
            let calc = ScheduleCalculator::new(New_York);
            let before = New_York.with_ymd_and_hms(2024, 3, 9, 2, 30, 0).unwrap();
            let next = calc.next_occurrence(before.timestamp(), 1, RepeatUnit::Day);
            let expected = New_York.with_ymd_and_hms(2024, 3, 10, 3, 30, 0).unwrap();
            assert_eq!(next, expected.timestamp());
        }

        #[test]
        fn test_skipped_local_time_shift_carries_forward() {
            let calc = ScheduleCalculator::new(New_York);
            let before = New_York.with_ymd_and_hms(2024, 3, 9, 2, 30, 0).unwrap();
            let shifted = calc.next_occurrence(before.timestamp(), 1, RepeatUnit::Day);
            let after = calc.next_occurrence(shifted, 1, RepeatUnit::Day);
            let expected = New_York.with_ymd_and_hms(2024, 3, 11, 3, 30, 0).unwrap();
            assert_eq!(after, expected.timestamp());
        }

        #[test]
        fn test_ambiguous_local_time_uses_earliest() {
            let calc = ScheduleCalculator::new(New_York);
            let before = New_York.with_ymd_and_hms(2024, 11, 2, 1, 30, 0).unwrap();
            let next = calc.next_occurrence(before.timestamp(), 1, RepeatUnit::Day);
            let expected = New_York
                .from_local_datetime(
                    &chrono::NaiveDate::from_ymd_opt(2024, 11, 3)
                        .unwrap()
                        .and_hms_opt(1, 30, 0)
                        .unwrap(),
                )
                .earliest()
                .unwrap();
            assert_eq!(next, expected.timestamp());
        }

        #[test]
        fn test_from_timezone_name() {
            assert!(ScheduleCalculator::from_timezone_name("Europe/Berlin").is_ok());
            let result = ScheduleCalculator::from_timezone_name("Mars/Olympus");
            assert!(matches!(result, Err(CoreError::InvalidTimezone(_))));
        }
    }

    mod preview_tests {
        use super::*;

        #[test]
        fn test_preview_includes_start_and_respects_count() {
            let calc = ScheduleCalculator::utc();
            let start = utc(2024, 1, 15);
            let upcoming = calc.preview(start, 1, RepeatUnit::Month, None, 3);
            assert_eq!(upcoming, vec![start, utc(2024, 2, 15), utc(2024, 3, 15)]);
        }

        #[test]
        fn test_preview_stops_at_end_date() {
            let calc = ScheduleCalculator::utc();
            let start = utc(2024, 1, 1);
            let upcoming = calc.preview(start, 1, RepeatUnit::Week, Some(utc(2024, 1, 15)), 10);
            assert_eq!(upcoming, vec![start, utc(2024, 1, 8), utc(2024, 1, 15)]);
        }
    }

    fn any_unit() -> impl Strategy<Value = RepeatUnit> {
        prop_oneof![
            Just(RepeatUnit::Day),
            Just(RepeatUnit::Week),
            Just(RepeatUnit::Month),
            Just(RepeatUnit::Year),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_next_occurrence_strictly_increases(
            current in 0i64..4_102_444_800,
            interval in 1u32..=1000,
            unit in any_unit(),
        ) {
            prop_assert!(next_occurrence(current, interval, unit) > current);
        }

        #[test]
        fn prop_next_occurrence_strictly_increases_with_dst(
            current in 0i64..4_102_444_800,
            interval in 1u32..=1000,
            unit in any_unit(),
        ) {
            let calc = ScheduleCalculator::new(New_York);
            prop_assert!(calc.next_occurrence(current, interval, unit) > current);
        }

        #[test]
        fn prop_next_occurrence_is_deterministic(
            current in 0i64..4_102_444_800,
            interval in 1u32..=1000,
            unit in any_unit(),
        ) {
            prop_assert_eq!(
                next_occurrence(current, interval, unit),
                next_occurrence(current, interval, unit)
            );
        }
    }
}
