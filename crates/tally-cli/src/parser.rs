use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

/// Parses a user-supplied date into a Unix timestamp.
///
/// ISO dates (`2024-01-31`) mean local midnight in `timezone`; anything else
/// goes through chrono-english ("today", "next monday", "31/01/2024").
pub fn parse_date(date_str: &str, timezone: Tz) -> Result<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") {
        return local_midnight(date, timezone);
    }

    let now = Utc::now().with_timezone(&timezone);
    parse_date_string(date_str, now, Dialect::Uk)
        .map(|dt| dt.timestamp())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", date_str, e))
}

fn local_midnight(date: NaiveDate, timezone: Tz) -> Result<i64> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date '{}'", date))?;
    // A DST change can skip midnight; the day then starts an hour later.
    timezone
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| timezone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.timestamp())
        .ok_or_else(|| anyhow!("'{}' does not exist in {}", date, timezone))
}
