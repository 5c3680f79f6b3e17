//! Parsers for the human-readable strings returned by the directions
//! connector ("1 hour 5 mins", "12.4 km", "Option 2 takes ... long!").

use regex::Regex;
use std::sync::LazyLock;

static RE_DURATION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(days?|hours?|hrs?|h|minutes?|mins?|m)\b").unwrap()
});
static RE_DISTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(km|m)\s*$").unwrap());
static RE_OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*option\s+(\d+)\s+takes\s+(.+?)\s+and\s+is\s+(.+?)\s+long!?\s*$").unwrap()
});

/// "1 hour 5 mins" -> 65.0. Returns None if any part of the text is not a
/// recognised duration component.
pub fn parse_duration_minutes(text: &str) -> Option<f64> {
    let non_space = |s: &str| s.chars().filter(|c| !c.is_whitespace()).count();

    let mut total = 0.0;
    let mut matched = 0usize;
    let mut covered = 0usize;

    for cap in RE_DURATION_PART.captures_iter(text) {
        let value: f64 = cap[1].parse().ok()?;
        let unit = cap[2].to_ascii_lowercase();
        let factor = if unit.starts_with('d') {
            24.0 * 60.0
        } else if unit.starts_with('h') {
            60.0
        } else {
            1.0
        };
        total += value * factor;
        matched += 1;
        covered += non_space(&cap[0]);
    }

    // Every non-blank character must belong to a duration component.
    if matched == 0 || covered != non_space(text) {
        return None;
    }
    Some(total)
}

/// "12.4 km" -> 12.4, "850 m" -> 0.85. Thousands separators are ignored.
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "");
    let cap = RE_DISTANCE.captures(&cleaned)?;
    let value: f64 = cap[1].parse().ok()?;
    match cap[2].to_ascii_lowercase().as_str() {
        "km" => Some(value),
        _ => Some(value / 1000.0),
    }
}

/// Header line emitted per alternative by the route finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionHeader {
    pub option: usize,
    pub travel_time_min: f64,
    pub distance_km: f64,
}

/// "Option 2 takes 35 mins and is 12.3 km long!" -> (2, 35.0, 12.3)
pub fn parse_option_line(line: &str) -> Option<OptionHeader> {
    let cap = RE_OPTION_LINE.captures(line)?;
    Some(OptionHeader {
        option: cap[1].parse().ok()?,
        travel_time_min: parse_duration_minutes(&cap[2])?,
        distance_km: parse_distance_km(&cap[3])?,
    })
}
