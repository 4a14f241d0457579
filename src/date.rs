//! Calendar dates as the budget API writes them.
//!
//! Newer versions of the API send ISO 8601 dates ("2024-05-01") or date-times
//! ("2024-05-01T00:00:00"), older ones send HTTP dates
//! ("Wed, 01 May 2024 00:00:00 GMT"). All of them are reduced to a [Date].

use serde::{Deserialize, Deserializer, Serializer, de};
use time::{
    Date, OffsetDateTime, format_description::well_known::Rfc2822, macros::format_description,
};

/// Parse a date typed by the user, only "YYYY-MM-DD" is accepted.
pub(crate) fn parse_iso_date(text: &str) -> Option<Date> {
    Date::parse(text, format_description!("[year]-[month]-[day]")).ok()
}

/// Parse a date sent by the budget API.
pub(crate) fn parse_api_date(text: &str) -> Option<Date> {
    let text = text.trim();

    if let Some(date) = text.get(..10).and_then(parse_iso_date) {
        return Some(date);
    }

    OffsetDateTime::parse(text, &Rfc2822)
        .ok()
        .map(|date_time| date_time.date())
}

/// Serde adapter for [Date] fields exchanged with the budget API.
pub(crate) mod api_date {
    use super::*;

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;

        parse_api_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date \"{raw}\"")))
    }

    pub(crate) fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(date)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{parse_api_date, parse_iso_date};

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_iso_date("2024-05-01"), Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn rejects_impossible_date() {
        assert_eq!(parse_iso_date("2024-02-30"), None);
        assert_eq!(parse_iso_date("01/05/2024"), None);
    }

    #[test]
    fn api_date_accepts_date_time() {
        assert_eq!(
            parse_api_date("2024-05-01T13:45:00"),
            Some(date!(2024 - 05 - 01))
        );
    }

    #[test]
    fn api_date_accepts_http_date() {
        assert_eq!(
            parse_api_date("Wed, 01 May 2024 00:00:00 GMT"),
            Some(date!(2024 - 05 - 01))
        );
    }

    #[test]
    fn api_date_rejects_garbage() {
        assert_eq!(parse_api_date("yesterday"), None);
    }
}
