//! Time zone text -> fixed UTC offset.
//!
//! Providers report session zones in several spellings. POSIX-style
//! abbreviations put the displayed offset in angle brackets and the
//! POSIX offset (west-positive) after it: `<+05>-05` is five hours east of
//! UTC. Every resolver here returns `None` on input it does not understand;
//! none of them panic.

use chrono::FixedOffset;
use once_cell::sync::Lazy;
use regex::Regex;

static POSIX_ABBREVIATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<([+-])(\d{1,2})(?::?(\d{2}))?>([+-]?)(\d{1,2})(?::(\d{2}))?$").unwrap()
});

static ETC_GMT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)etc/gmt([+-])(\d{1,2})$").unwrap());

static ISO_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{2})(?::?(\d{2}))?$").unwrap());

static UTC_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(?:utc|gmt)([+-])(\d{1,2})(?::(\d{2}))?$").unwrap());

/// Well-known abbreviations and their offsets in minutes east of UTC.
const ABBREVIATIONS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    ("WET", 0),
    ("WEST", 60),
    ("CET", 60),
    ("CEST", 120),
    ("EET", 120),
    ("EEST", 180),
    ("MSK", 180),
    ("IST", 330),
    ("SGT", 480),
    ("HKT", 480),
    ("JST", 540),
    ("KST", 540),
    ("AEST", 600),
    ("AEDT", 660),
    ("NZST", 720),
    ("NZDT", 780),
    ("EST", -300),
    ("EDT", -240),
    ("CST", -360),
    ("CDT", -300),
    ("MST", -420),
    ("MDT", -360),
    ("PST", -480),
    ("PDT", -420),
];

const MAX_HOURS: i32 = 15;

/// Resolve a zone spelling to a fixed offset.
///
/// Accepted forms: POSIX `<+05>-05` (one or two hour digits, optional
/// minutes), `Etc/GMT-5` (sign inverted), ISO `+05:30` / `+0530` / `+05`,
/// `UTC+5` / `UTC-03:30`, and the abbreviation table above. The bracketed
/// and trailing parts of a POSIX abbreviation must agree numerically, so
/// `<+2>-2` and `<+02>-02` resolve the same.
pub fn resolve_timezone(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = POSIX_ABBREVIATION.captures(text) {
        let shown = signed_minutes(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()))?;
        let posix_sign = if &caps[4] == "-" { "-" } else { "+" };
        let posix = signed_minutes(posix_sign, &caps[5], caps.get(6).map(|m| m.as_str()))?;
        if shown != -posix {
            return None;
        }
        return offset(shown);
    }

    if let Some(caps) = ETC_GMT.captures(text) {
        let minutes = signed_minutes(&caps[1], &caps[2], None)?;
        return offset(-minutes);
    }

    if let Some(caps) = ISO_OFFSET.captures(text) {
        return offset(signed_minutes(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()))?);
    }

    if let Some(caps) = UTC_OFFSET.captures(text) {
        return offset(signed_minutes(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()))?);
    }

    let upper = text.to_ascii_uppercase();
    ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == upper)
        .and_then(|(_, minutes)| offset(*minutes))
}

fn signed_minutes(sign: &str, hours: &str, minutes: Option<&str>) -> Option<i32> {
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.map(str::parse::<i32>).transpose().ok()?.unwrap_or(0);
    if hours > MAX_HOURS || minutes >= 60 {
        return None;
    }
    let total = hours * 60 + minutes;
    Some(if sign == "-" { -total } else { total })
}

fn offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(h: i32) -> Option<FixedOffset> {
        FixedOffset::east_opt(h * 3600)
    }

    #[test]
    fn test_posix_abbreviation() {
        assert_eq!(resolve_timezone("<+05>-05"), hours(5));
        assert_eq!(resolve_timezone("<-03>3"), hours(-3));
        assert_eq!(resolve_timezone("<+0530>-05:30"), FixedOffset::east_opt(19_800));
        assert_eq!(resolve_timezone("<+2>-2"), resolve_timezone("<+02>-02"));
        assert_eq!(resolve_timezone("<+05>-04"), None);
    }

    #[test]
    fn test_posix_matches_native_zone_name() {
        assert_eq!(resolve_timezone("<+05>-05"), resolve_timezone("Etc/GMT-5"));
        assert_eq!(resolve_timezone("<-08>+08"), resolve_timezone("Etc/GMT+8"));
    }

    #[test]
    fn test_iso_and_utc_forms() {
        assert_eq!(resolve_timezone("+02:00"), hours(2));
        assert_eq!(resolve_timezone("-0330"), FixedOffset::east_opt(-12_600));
        assert_eq!(resolve_timezone("UTC+3"), hours(3));
        assert_eq!(resolve_timezone("utc"), hours(0));
    }

    #[test]
    fn test_abbreviation_table() {
        assert_eq!(resolve_timezone("EST"), hours(-5));
        assert_eq!(resolve_timezone("cest"), hours(2));
        assert_eq!(resolve_timezone("IST"), FixedOffset::east_opt(19_800));
    }

    #[test]
    fn test_malformed_returns_none() {
        for text in ["", "  ", "<+>-", "<abc>xyz", "Mars/Olympus", "+99:00", "<+05>", "Etc/GMT+"] {
            assert_eq!(resolve_timezone(text), None, "{text}");
        }
    }
}
