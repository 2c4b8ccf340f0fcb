use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Milliseconds in one minute, the unit session gaps are measured against.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses a calendar timestamp into epoch milliseconds.
///
/// Values carrying an offset are converted to UTC; naive values are read as
/// UTC. Returns `None` for anything unrecognised.
pub fn parse_calendar(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(value, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc().timestamp_millis())
    })
}

/// Parses a raw epoch-millisecond cell. Decimal values are rounded; values
/// outside the `i64` range are unparseable.
pub fn parse_millis(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if let Ok(parsed) = value.parse::<i64>() {
        return Some(parsed);
    }

    value
        .parse::<f64>()
        .ok()
        .map(f64::round)
        .filter(|parsed| (i64::MIN as f64..i64::MAX as f64).contains(parsed))
        .map(|parsed| parsed as i64)
}
