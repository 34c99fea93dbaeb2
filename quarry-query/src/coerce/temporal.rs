//! Parsing and formatting of dates, times and timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Default rendering of a timestamp.
pub const TIMESTAMP_OUTPUT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn parse_date(input: &str, format: Option<&str>) -> Result<NaiveDate, String> {
    let input = input.trim();
    if let Some(format) = format {
        return NaiveDate::parse_from_str(input, format)
            .map_err(|e| format!("`{}` does not match `{}`: {}", input, format, e));
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
        .or_else(|| parse_timestamp(input, None).ok().map(|ts| ts.date()))
        .ok_or_else(|| format!("`{}` is not an ISO date", input))
}

pub(crate) fn parse_time(input: &str, format: Option<&str>) -> Result<NaiveTime, String> {
    let input = input.trim();
    if let Some(format) = format {
        return NaiveTime::parse_from_str(input, format)
            .map_err(|e| format!("`{}` does not match `{}`: {}", input, format, e));
    }
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(input, f).ok())
        .ok_or_else(|| format!("`{}` is not an ISO time", input))
}

/// Parse a timestamp; a bare date means midnight and an RFC 3339 offset is
/// normalized to UTC.
pub(crate) fn parse_timestamp(input: &str, format: Option<&str>) -> Result<NaiveDateTime, String> {
    let input = input.trim();
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(input, format)
            .or_else(|_| NaiveDate::parse_from_str(input, format).map(|d| d.and_time(NaiveTime::MIN)))
            .map_err(|e| format!("`{}` does not match `{}`: {}", input, format, e));
    }
    if let Some(ts) = TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
    {
        return Ok(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(input, f).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok_or_else(|| format!("`{}` is not an ISO timestamp", input))
}

pub(crate) fn from_epoch_millis(millis: i64) -> Result<NaiveDateTime, String> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| format!("{} is out of range for a timestamp", millis))
}

pub(crate) fn to_epoch_millis(ts: &NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

pub(crate) fn format_date(date: &NaiveDate, format: Option<&str>) -> String {
    date.format(format.unwrap_or("%Y-%m-%d")).to_string()
}

pub(crate) fn format_time(time: &NaiveTime, format: Option<&str>) -> String {
    time.format(format.unwrap_or("%H:%M:%S%.f")).to_string()
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime, format: Option<&str>) -> String {
    ts.format(format.unwrap_or(TIMESTAMP_OUTPUT)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 10:30:00", None).unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T10:30", None).unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T11:30:00+01:00", None).unwrap(), expected);
        assert_eq!(
            parse_timestamp("01/03/2024 10:30", Some("%d/%m/%Y %H:%M")).unwrap(),
            expected
        );
    }

    #[test]
    fn test_date_only_is_midnight() {
        let ts = parse_timestamp("2024-03-01", None).unwrap();
        assert_eq!(ts.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_parse_time_and_date() {
        assert_eq!(
            parse_time("08:15", None).unwrap(),
            NaiveTime::from_hms_opt(8, 15, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-03-01 10:30:00", None).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("yesterday", None).is_err());
    }

    #[test]
    fn test_epoch_millis() {
        let ts = from_epoch_millis(86_400_000).unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(to_epoch_millis(&ts), 86_400_000);
    }

    #[test]
    fn test_format_timestamp() {
        let ts = parse_timestamp("2024-03-01 10:30:00.250", None).unwrap();
        assert_eq!(format_timestamp(&ts, None), "2024-03-01 10:30:00.250");
        assert_eq!(format_timestamp(&ts, Some("%d.%m.%Y")), "01.03.2024");
    }
}
