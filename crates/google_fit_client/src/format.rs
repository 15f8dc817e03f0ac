//! Timestamp and weekday formatting for output records.

use crate::FitError;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// `yyyy-MM-ddTHH:mm:ss.SSS±HHMM`
pub const TIMESTAMP_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

fn at<Tz: TimeZone>(ms: i64, tz: &Tz) -> Result<DateTime<Tz>, FitError> {
    tz.timestamp_millis_opt(ms)
        .single()
        .ok_or(FitError::InvalidTimestamp(ms))
}

/// Format an epoch-millisecond instant in `tz` with a numeric UTC offset.
pub fn format_timestamp<Tz>(ms: i64, tz: &Tz) -> Result<String, FitError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Ok(at(ms, tz)?.format(TIMESTAMP_PATTERN).to_string())
}

/// Three-letter weekday of the instant as seen in `tz` (e.g. `Tue`).
///
/// Always English: chrono's `%a` ignores the process locale.
pub fn weekday_label<Tz>(ms: i64, tz: &Tz) -> Result<String, FitError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    Ok(at(ms, tz)?.format("%a").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn formats_with_millis_and_offset() {
        let s = format_timestamp(1_700_000_000_123, &Utc).unwrap();
        assert_eq!(s, "2023-11-14T22:13:20.123+0000");
    }

    #[test]
    fn formats_in_fixed_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let s = format_timestamp(1_700_000_000_000, &tz).unwrap();
        assert_eq!(s, "2023-11-15T00:13:20.000+0200");
        let tz = FixedOffset::west_opt(5 * 3600 + 1800).unwrap();
        let s = format_timestamp(0, &tz).unwrap();
        assert_eq!(s, "1969-12-31T18:30:00.000-0530");
    }

    #[test]
    fn weekday_depends_on_zone() {
        assert_eq!(weekday_label(1_700_000_000_000, &Utc).unwrap(), "Tue");
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(weekday_label(1_700_000_000_000, &tz).unwrap(), "Wed");
    }

    #[test]
    fn out_of_range_timestamp_errors() {
        let err = format_timestamp(i64::MAX, &Utc).unwrap_err();
        assert!(matches!(err, FitError::InvalidTimestamp(i64::MAX)));
    }
}
