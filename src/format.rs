//! Display helpers: relative dates and page titles.

use chrono::{DateTime, NaiveDateTime, Utc};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;
/// Beyond this, show the calendar date instead.
const RELATIVE_LIMIT_MINUTES: i64 = 30 * MINUTES_PER_DAY;

/// Parse a server timestamp. Timestamps without an offset are UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// `Just now`, `5m ago`, `3h ago`, `2d ago`, or `M/D/YYYY` from 30 days on.
///
/// Future timestamps count as now. Unparseable input is returned as is.
pub fn format_relative_date(input: &str, now: DateTime<Utc>) -> String {
    let Some(date) = parse_timestamp(input) else {
        return input.to_string();
    };
    let minutes = (now - date).num_minutes().max(0);
    match minutes {
        0 => "Just now".to_string(),
        m if m < MINUTES_PER_HOUR => format!("{m}m ago"),
        m if m < MINUTES_PER_DAY => format!("{}h ago", m / MINUTES_PER_HOUR),
        m if m < RELATIVE_LIMIT_MINUTES => format!("{}d ago", m / MINUTES_PER_DAY),
        _ => date.format("%-m/%-d/%Y").to_string(),
    }
}

/// `"{title} | {app_name}"`
pub fn page_title(title: &str, app_name: &str) -> String {
    format!("{title} | {app_name}")
}
