//! Publication date normalization.
//!
//! Feed producers disagree on date formatting. Patterns are tried in order,
//! the feed-standard RFC 2822 family first.

use chrono::{DateTime, NaiveDateTime, Utc, Weekday};

/// RFC 1123 without the zone field.
const RFC1123_NO_ZONE: &[&str] = &["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Convert a raw `pubDate` into an absolute UTC timestamp.
///
/// Returns `None` when no known pattern matches; the caller drops the entry.
pub fn normalize(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(dt) = parse_rfc1123(trimmed) {
        return Some(dt);
    }

    // chrono rejects a weekday that disagrees with the date; retry without it.
    if let Some(dt) = strip_weekday(trimmed).and_then(parse_rfc1123) {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_rfc1123(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_unknown_zone(s)
}

/// `"Tue, 02 Jan 2006 ..."` -> `"02 Jan 2006 ..."`, only when the prefix
/// is a weekday name.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    day.trim().parse::<Weekday>().ok()?;
    Some(rest.trim_start())
}

/// RFC 1123 stamped with a zone abbreviation chrono does not know (`MSK`,
/// `CEST`, ...). The abbreviation carries no offset we can trust, so the wall
/// time is read as UTC.
fn parse_unknown_zone(s: &str) -> Option<DateTime<Utc>> {
    let (rest, zone) = s.rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    RFC1123_NO_ZONE
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(rest.trim_end(), fmt).ok())
        .map(|naive| naive.and_utc())
}
