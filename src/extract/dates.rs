//! Date normalization
//!
//! Entry dates come either from a structured `datetime` attribute or from
//! free text parsed with a strftime-style pattern. Everything is interpreted
//! in UTC. Dates that land in the future are pulled back one year at a time;
//! anything unparseable resolves to "now".

use chrono::{
    DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use std::fmt;

/// Format specifiers that carry a year
const YEAR_SPECIFIERS: &[&str] = &["%Y", "%y", "%G", "%g", "%C", "%s", "%+", "%c", "%D", "%F", "%x"];

/// Formats tried for ISO-like markers without an explicit offset
const LOCAL_ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Where a raw date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource<'a> {
    /// A `datetime` attribute: `2024-03-15` or a full ISO timestamp
    Marker(&'a str),
    /// Element text plus the pattern it is written in
    Text { text: &'a str, format: &'a str },
}

impl fmt::Display for DateSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker(marker) => write!(f, "datetime=\"{}\"", marker),
            Self::Text { text, format } => write!(f, "content=\"{}\" format=\"{}\"", text, format),
        }
    }
}

/// Parses `source` into a UTC timestamp no later than `now`
///
/// Never fails: unparseable input yields `now`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use feed_scotty::{normalize_date, DateSource};
///
/// let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
/// let date = normalize_date(DateSource::Marker("2024-03-15"), now);
/// assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
/// ```
pub fn normalize_date(source: DateSource<'_>, now: DateTime<Utc>) -> DateTime<Utc> {
    let parsed = match source {
        DateSource::Marker(marker) => parse_datetime_marker(marker),
        DateSource::Text { text, format } => parse_with_format(text.trim(), format, now),
    };

    match parsed {
        Some(date) => correct_future_date(date, now, &source),
        None => {
            tracing::debug!("Could not parse date ({}); using the current time", source);
            now
        }
    }
}

/// Parses a `datetime` attribute value
///
/// Values with fewer than three `-`-separated parts are not dates. A third
/// part longer than two characters means a full ISO timestamp; otherwise the
/// value is a plain `YYYY-MM-DD` date at midnight UTC.
pub fn parse_datetime_marker(marker: &str) -> Option<DateTime<Utc>> {
    let marker = marker.trim();
    let parts: Vec<&str> = marker.split('-').collect();
    if parts.len() < 3 {
        return None;
    }

    if parts[2].len() > 2 {
        return parse_iso(marker);
    }

    let year = parts[0].trim().parse::<i32>().ok()?;
    let month = parts[1].trim().parse::<u32>().ok()?;
    let day = parts[2].trim().parse::<u32>().ok()?;
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(date.with_timezone(&Utc));
    }
    LOCAL_ISO_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parses free text against a strftime pattern
///
/// Missing fields are taken from `now`: the current year for patterns
/// without one, midnight for patterns without a time, today for patterns
/// with only a time.
fn parse_with_format(text: &str, format: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_complete(text, format) {
        return Some(date);
    }

    if !has_year(format) {
        let text = format!("{} {}", text, now.year());
        let format = format!("{} %Y", format);
        if let Some(date) = parse_complete(&text, &format) {
            return Some(date);
        }
    }

    NaiveTime::parse_from_str(text, format)
        .ok()
        .map(|time| Utc.from_utc_datetime(&now.date_naive().and_time(time)))
}

fn parse_complete(text: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_str(text, format) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

fn has_year(format: &str) -> bool {
    YEAR_SPECIFIERS.iter().any(|specifier| format.contains(specifier))
}

/// Subtracts whole years until `date` is no later than `now`
fn correct_future_date(
    date: DateTime<Utc>,
    now: DateTime<Utc>,
    source: &DateSource<'_>,
) -> DateTime<Utc> {
    let mut corrected = date;
    while corrected > now {
        let Some(previous) = corrected.checked_sub_months(Months::new(12)) else {
            break;
        };
        tracing::warn!(
            "Date {} is in the future ({}); subtracting 1 year",
            corrected.to_rfc3339(),
            source
        );
        corrected = previous;
    }
    corrected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_date_only_marker() {
        assert_eq!(
            normalize_date(DateSource::Marker("2024-03-15"), now()),
            utc(2024, 3, 15, 0, 0, 0)
        );
        assert_eq!(
            normalize_date(DateSource::Marker("2024-3-5"), now()),
            utc(2024, 3, 5, 0, 0, 0)
        );
    }

    #[test]
    fn test_iso_marker() {
        assert_eq!(
            normalize_date(DateSource::Marker("2024-03-15T10:30:00+02:00"), now()),
            utc(2024, 3, 15, 8, 30, 0)
        );
        assert_eq!(
            normalize_date(DateSource::Marker("2024-03-15T10:30:00Z"), now()),
            utc(2024, 3, 15, 10, 30, 0)
        );
        assert_eq!(
            normalize_date(DateSource::Marker("2024-03-15T10:30"), now()),
            utc(2024, 3, 15, 10, 30, 0)
        );
    }

    #[test]
    fn test_not_a_marker_falls_back_to_now() {
        assert_eq!(parse_datetime_marker("2024-03"), None);
        assert_eq!(parse_datetime_marker("yesterday"), None);
        assert_eq!(normalize_date(DateSource::Marker("2024-03"), now()), now());
        assert_eq!(normalize_date(DateSource::Marker("2024-13-45"), now()), now());
    }

    #[test]
    fn test_text_with_full_format() {
        let source = DateSource::Text {
            text: " 15/03/2024 ",
            format: "%d/%m/%Y",
        };
        assert_eq!(normalize_date(source, now()), utc(2024, 3, 15, 0, 0, 0));

        let source = DateSource::Text {
            text: "March 15, 2024 at 09:45",
            format: "%B %d, %Y at %H:%M",
        };
        assert_eq!(normalize_date(source, now()), utc(2024, 3, 15, 9, 45, 0));
    }

    #[test]
    fn test_text_without_year_uses_current_year() {
        let source = DateSource::Text {
            text: "15 March",
            format: "%d %B",
        };
        assert_eq!(normalize_date(source, now()), utc(2024, 3, 15, 0, 0, 0));
    }

    #[test]
    fn test_text_with_only_time_uses_today() {
        let source = DateSource::Text {
            text: "08:15",
            format: "%H:%M",
        };
        assert_eq!(normalize_date(source, now()), utc(2024, 6, 1, 8, 15, 0));
    }

    #[test]
    fn test_future_date_is_pulled_back() {
        let source = DateSource::Text {
            text: "15 December",
            format: "%d %B",
        };
        assert_eq!(normalize_date(source, now()), utc(2023, 12, 15, 0, 0, 0));

        assert_eq!(
            normalize_date(DateSource::Marker("2026-07-01"), now()),
            utc(2023, 7, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_past_and_present_dates_are_untouched() {
        assert_eq!(
            normalize_date(DateSource::Marker("2024-06-01T12:00:00Z"), now()),
            now()
        );
        assert_eq!(
            normalize_date(DateSource::Marker("1999-12-31"), now()),
            utc(1999, 12, 31, 0, 0, 0)
        );
    }

    #[test]
    fn test_unparseable_text_falls_back_to_now() {
        let source = DateSource::Text {
            text: "a while ago",
            format: "%d/%m/%Y",
        };
        assert_eq!(normalize_date(source, now()), now());

        let source = DateSource::Text {
            text: "",
            format: "%d/%m/%Y",
        };
        assert_eq!(normalize_date(source, now()), now());
    }

    #[test]
    fn test_has_year() {
        assert!(has_year("%d/%m/%Y"));
        assert!(has_year("%F"));
        assert!(!has_year("%d %B"));
        assert!(!has_year("%H:%M"));
    }
}
