// src/convert/dates.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DCAT_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Reduce a published timestamp to `YYYY-MM-DD`.
///
/// Accepts the usual `2024-03-01T12:00:00.000Z` form, any RFC 3339
/// timestamp, or a bare date.
pub fn to_date_only(raw: &str) -> Option<String> {
    parse_date(raw.trim()).map(|date| date.format("%Y-%m-%d").to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, DCAT_TIMESTAMP) {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_utc_timestamp() {
        assert_eq!(to_date_only("2016-07-12T19:21:33.000Z").as_deref(), Some("2016-07-12"));
    }

    #[test]
    fn timestamp_without_fraction() {
        assert_eq!(to_date_only("2016-07-12T19:21:33Z").as_deref(), Some("2016-07-12"));
    }

    #[test]
    fn offset_timestamp_keeps_local_date() {
        assert_eq!(
            to_date_only("2016-07-12T23:30:00-05:00").as_deref(),
            Some("2016-07-12")
        );
    }

    #[test]
    fn bare_date() {
        assert_eq!(to_date_only(" 2020-01-31 ").as_deref(), Some("2020-01-31"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(to_date_only("last tuesday"), None);
        assert_eq!(to_date_only(""), None);
    }
}
