//! Date parsing for request bodies with user-friendly error messages.

use chrono::{DateTime, Utc};

/// Parse a note's meeting date.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+02:00`) and
/// the compact offset form `2024-01-15T10:30:00+0200`.
pub fn parse_meeting_date(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            format!(
                "Invalid meeting_date '{}'. Expected RFC 3339 (e.g. '2024-01-15T10:30:00Z') or '2024-01-15T10:30:00+0200'",
                value
            )
        })
}

/// Parse an RFC 3339 timestamp such as a todo due date.
pub fn parse_rfc3339(field: &str, value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            format!(
                "Invalid {} '{}'. Expected RFC 3339 (e.g. '2024-01-15T10:30:00Z')",
                field, value
            )
        })
}

/// Parse an optional date field, treating a blank string as absent.
pub fn parse_optional<F>(value: Option<&str>, parse: F) -> Result<Option<DateTime<Utc>>, String>
where
    F: Fn(&str) -> Result<DateTime<Utc>, String>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse(v).map(Some),
    }
}

/// Parse a date field of a partial update.
///
/// Absent leaves the column alone, a blank string clears it.
pub fn parse_clearable<F>(
    value: Option<&str>,
    parse: F,
) -> Result<Option<Option<DateTime<Utc>>>, String>
where
    F: Fn(&str) -> Result<DateTime<Utc>, String>,
{
    match value.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(v) => parse(v).map(|dt| Some(Some(dt))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_meeting_date_rfc3339() {
        let dt = parse_meeting_date("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());

        let dt = parse_meeting_date("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_meeting_date_compact_offset() {
        let dt = parse_meeting_date("2024-01-15T10:30:00-0500").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 15, 30, 0).unwrap());
    }

    #[test]
    fn test_meeting_date_rejects_other_formats() {
        for bad in ["2024-01-15", "yesterday", "15/01/2024 10:30", "2024-01-15T10:30:00"] {
            let err = parse_meeting_date(bad).unwrap_err();
            assert!(err.contains("meeting_date"), "{}", err);
        }
    }

    #[test]
    fn test_parse_optional_blank_is_none() {
        assert_eq!(parse_optional(None, parse_meeting_date).unwrap(), None);
        assert_eq!(parse_optional(Some("  "), parse_meeting_date).unwrap(), None);
        assert!(parse_optional(Some("nope"), |v| parse_rfc3339("due_date", v)).is_err());
    }

    #[test]
    fn test_parse_clearable_blank_clears() {
        assert_eq!(parse_clearable(None, parse_meeting_date).unwrap(), None);
        assert_eq!(
            parse_clearable(Some(""), parse_meeting_date).unwrap(),
            Some(None)
        );
        assert_eq!(
            parse_clearable(Some("2024-01-15T10:30:00Z"), parse_meeting_date).unwrap(),
            Some(Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()))
        );
        assert!(parse_clearable(Some("soon"), parse_meeting_date).is_err());
    }
}
