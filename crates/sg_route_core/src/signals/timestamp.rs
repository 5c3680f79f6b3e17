use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{EngineError, EngineResult};

/// Storage format of every snapshot timestamp column.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static RE_MESSAGE_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\((\d{1,2})/(\d{1,2})\)(\d{1,2}):(\d{2})(?:\s+|$)").unwrap());

/// Split an incident message of the form `(DD/MM)HH:MM <text>` into its event
/// time and the remaining text.
///
/// The token carries no year: the year of `now` is used, or the previous one
/// when that would put the event more than a day in the future (a 31/12
/// message read on 1 January).
pub fn parse_message_timestamp(message: &str, now: NaiveDateTime) -> EngineResult<(NaiveDateTime, &str)> {
    let malformed = || EngineError::MalformedTimestamp {
        raw: message.chars().take(32).collect(),
    };

    let cap = RE_MESSAGE_STAMP.captures(message).ok_or_else(malformed)?;
    let field = |i: usize| cap[i].parse::<u32>().map_err(|_| malformed());
    let (day, month, hour, minute) = (field(1)?, field(2)?, field(3)?, field(4)?);

    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)?;
    let at_year = |year: i32| NaiveDate::from_ymd_opt(year, month, day).map(|d| d.and_time(time));

    let mut at = at_year(now.year());
    if at.is_none_or(|t| t > now + Duration::days(1)) {
        at = at_year(now.year() - 1).or(at);
    }
    let at = at.ok_or_else(malformed)?;

    let body_start = cap.get(0).map_or(0, |m| m.end());
    Ok((at, message[body_start..].trim()))
}

/// Parse a snapshot timestamp as written by the importers. Fractional seconds
/// and a `T` separator are tolerated.
pub fn parse_store_timestamp(raw: &str) -> EngineResult<NaiveDateTime> {
    let s = raw.trim();
    for fmt in [
        STORE_TIMESTAMP_FORMAT,
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    Err(EngineError::MalformedTimestamp { raw: s.to_string() })
}

/// Road works dates arrive as `YYYY-MM-DD`, sometimes with a time suffix.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn format_store_timestamp(t: NaiveDateTime) -> String {
    t.format(STORE_TIMESTAMP_FORMAT).to_string()
}

/// Oldest instant still inside the window.
pub fn window_start(now: NaiveDateTime, window: Duration) -> NaiveDateTime {
    now - window
}

/// Strict recency check: `at >= since`.
pub fn is_recent(at: NaiveDateTime, since: NaiveDateTime) -> bool {
    at >= since
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, STORE_TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn parses_token_and_body() {
        let now = at("2024-03-15 10:00:00");
        let (t, body) =
            parse_message_timestamp("(15/3)09:42 Accident on PIE (towards Changi).", now).unwrap();
        assert_eq!(t, at("2024-03-15 09:42:00"));
        assert_eq!(body, "Accident on PIE (towards Changi).");
    }

    #[test]
    fn year_rolls_back_across_new_year() {
        let now = at("2024-01-01 00:20:00");
        let (t, _) = parse_message_timestamp("(31/12)23:55 Roadworks on AYE.", now).unwrap();
        assert_eq!(t, at("2023-12-31 23:55:00"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let now = at("2024-03-15 10:00:00");
        for bad in [
            "Accident on PIE",
            "(15/03) 09:42 Accident",
            "(32/03)09:42 Accident",
            "(15/13)09:42 Accident",
            "(15/03)25:10 Accident",
            "(15/03)09:42Accident",
            "",
        ] {
            assert!(
                matches!(
                    parse_message_timestamp(bad, now),
                    Err(EngineError::MalformedTimestamp { .. })
                ),
                "expected failure for {bad:?}"
            );
        }
    }

    #[test]
    fn leap_day_outside_leap_year_is_malformed() {
        let now = at("2023-03-01 10:00:00");
        assert!(parse_message_timestamp("(29/02)08:00 Breakdown on CTE", now).is_err());
    }

    #[test]
    fn store_timestamps() {
        assert_eq!(
            parse_store_timestamp("2024-03-15 09:42:10.123456").unwrap(),
            at("2024-03-15 09:42:10")
                + Duration::microseconds(123_456)
        );
        assert_eq!(parse_store_timestamp("2024-03-15T09:42:10").unwrap(), at("2024-03-15 09:42:10"));
        assert!(parse_store_timestamp("yesterday").is_err());
        assert_eq!(format_store_timestamp(at("2024-03-15 09:42:10")), "2024-03-15 09:42:10");
    }

    #[test]
    fn feed_dates() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_feed_date("2024-03-15"), Some(d));
        assert_eq!(parse_feed_date(" 2024-03-15 00:00:00"), Some(d));
        assert_eq!(parse_feed_date("15/03/2024"), None);
    }

    #[test]
    fn recency_is_inclusive_at_the_boundary() {
        let now = at("2024-03-15 10:00:00");
        let since = window_start(now, Duration::hours(1));
        assert!(is_recent(at("2024-03-15 09:00:00"), since));
        assert!(!is_recent(at("2024-03-15 08:59:59"), since));
    }
}
