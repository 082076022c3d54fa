//! Timestamp parsing and formatting.
//!
//! Stored encounter dates carry no zone. They are read as UTC and written in
//! extended ISO-8601 with an explicit `+00:00` offset, e.g.
//! `2023-06-01T09:30:00+00:00`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const EXTENDED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Formats an instant in extended ISO-8601 with a `+00:00` offset.
pub fn format_extended(instant: DateTime<Utc>) -> String {
    instant.format(EXTENDED_FORMAT).to_string()
}

/// Parses a stored timestamp, treating zone-less values as UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// and bare dates (midnight).
pub fn parse_stored(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Converts a stored timestamp to extended ISO-8601.
pub fn stored_to_extended(value: &str) -> Option<String> {
    parse_stored(value).map(format_extended)
}

/// Adds `delta`, clamping to the representable range instead of panicking.
pub fn saturating_add(instant: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    instant.checked_add_signed(delta).unwrap_or(if delta < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// The implicit range covered by a date search value.
///
/// A bare date covers the whole day; a full timestamp covers one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Parses a date search value into its implicit range.
    ///
    /// At the upper limit of representable time the range end is clamped to
    /// [`DateTime::<Utc>::MAX_UTC`].
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            let start = date.and_hms_opt(0, 0, 0)?.and_utc();
            return Some(Self::spanning(start, Duration::days(1)));
        }

        let start = parse_stored(value)?;
        Some(Self::spanning(start, Duration::seconds(1)))
    }

    fn spanning(start: DateTime<Utc>, width: Duration) -> Self {
        Self {
            start,
            end: saturating_add(start, width),
        }
    }

    /// Returns true if the instant falls inside the range.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_extended() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(format_extended(instant), "2023-12-31T00:00:00+00:00");
    }

    #[test]
    fn test_parse_stored_variants() {
        let expected = Utc.with_ymd_and_hms(2023, 6, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_stored("2023-06-01 09:30:00"), Some(expected));
        assert_eq!(parse_stored("2023-06-01T09:30:00"), Some(expected));
        assert_eq!(parse_stored("2023-06-01T09:30:00Z"), Some(expected));
        assert_eq!(parse_stored("2023-06-01T11:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_stored("2023-06-01"),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_stored(""), None);
        assert_eq!(parse_stored("yesterday"), None);
    }

    #[test]
    fn test_stored_is_reinterpreted_as_utc() {
        assert_eq!(
            stored_to_extended("2021-02-03 04:05:06").as_deref(),
            Some("2021-02-03T04:05:06+00:00")
        );
    }

    #[test]
    fn test_date_range_precision() {
        let day = DateRange::parse("2023-01-01").unwrap();
        assert!(day.contains(Utc.with_ymd_and_hms(2023, 1, 1, 23, 59, 59).unwrap()));
        assert!(!day.contains(Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()));

        let second = DateRange::parse("2023-12-31T00:00:00+00:00").unwrap();
        assert_eq!(second.end - second.start, Duration::seconds(1));
        assert!(DateRange::parse("not-a-date").is_none());
    }

    #[test]
    fn test_date_range_at_the_limits_of_time() {
        let last_day = DateRange::parse("+262142-12-31").unwrap();
        assert_eq!(last_day.end, DateTime::<Utc>::MAX_UTC);
        assert!(last_day.contains(last_day.start));

        let first_day = DateRange::parse("-262143-01-01").unwrap();
        assert_eq!(
            saturating_add(first_day.start, -Duration::days(1)),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn test_saturating_add() {
        let max = DateTime::<Utc>::MAX_UTC;
        let min = DateTime::<Utc>::MIN_UTC;
        assert_eq!(saturating_add(max, Duration::days(1)), max);
        assert_eq!(saturating_add(min, Duration::days(-1)), min);

        let instant = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            saturating_add(instant, Duration::days(-1)),
            Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap()
        );
    }
}
