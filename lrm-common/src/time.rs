//! Date utilities

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Today's date in the server's local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO date, tolerating a trailing time component
///
/// Returns `None` for blank or unparseable input.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Human readable date: `March 05, 2026`, or `Not set`
pub fn format_long_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%B %d, %Y").to_string(),
        None => "Not set".to_string(),
    }
}

/// Serde helpers for optional dates stored as ISO strings
///
/// Unparseable strings read as `None` instead of failing the whole record.
pub mod opt_date {
    use super::parse_date;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.as_deref().and_then(parse_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_date("2026-03-05"), NaiveDate::from_ymd_opt(2026, 3, 5));
    }

    #[test]
    fn test_parse_datetime_keeps_date() {
        assert_eq!(
            parse_date("2026-03-05T10:30:00"),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
        assert_eq!(
            parse_date("2026-03-05T10:30:00-05:00"),
            NaiveDate::from_ymd_opt(2026, 3, 5)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date("2026-02-30"), None);
    }

    #[test]
    fn test_format_long_date() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 5);
        assert_eq!(format_long_date(d), "March 05, 2026");
        assert_eq!(format_long_date(None), "Not set");
    }
}
