use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Default zone used for display formatting.
pub const DEFAULT_TIME_ZONE: &str = "Pacific Time (US & Canada)";

/// Display names that map onto IANA zones.
const ZONE_ALIASES: &[(&str, &str)] = &[
    ("Pacific Time (US & Canada)", "America/Los_Angeles"),
    ("Mountain Time (US & Canada)", "America/Denver"),
    ("Central Time (US & Canada)", "America/Chicago"),
    ("Eastern Time (US & Canada)", "America/New_York"),
    ("Alaska", "America/Juneau"),
    ("Hawaii", "Pacific/Honolulu"),
    ("Arizona", "America/Phoenix"),
    ("UTC", "Etc/UTC"),
];

/// Resolve a zone by IANA name or display alias.
pub fn resolve_time_zone(name: &str) -> Option<Tz> {
    let name = name.trim();
    let iana = ZONE_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, iana)| *iana)
        .unwrap_or(name);

    iana.parse::<Tz>().ok()
}

/// Parse the timestamp forms seen in provider and cached payloads.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // 2023-09-07 19:00:00 +0000
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }

    // 2023-09-07 19:00:00 UTC
    let naive = s.strip_suffix(" UTC").unwrap_or(s);
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    None
}

/// "9:00am PDT"
pub fn format_time_of_day(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%-I:%M%P %Z").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2023, 9, 7, 19, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2023-09-07T19:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-09-07T12:00:00-07:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-09-07 19:00:00 UTC"), Some(expected));
        assert_eq!(parse_timestamp("2023-09-07 19:00:00 +0000"), Some(expected));
        assert_eq!(parse_timestamp("2023-09-07T19:00"), Some(expected));
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("foo"), None);
        assert_eq!(parse_timestamp("2023"), None);
    }

    #[test]
    fn resolves_aliases_and_iana_names() {
        assert_eq!(
            resolve_time_zone("Pacific Time (US & Canada)"),
            Some(chrono_tz::America::Los_Angeles)
        );
        assert_eq!(resolve_time_zone("Europe/Berlin"), Some(chrono_tz::Europe::Berlin));
        assert_eq!(resolve_time_zone("Nowhere/Special"), None);
    }

    #[test]
    fn formats_time_of_day_in_zone() {
        let at = Utc.with_ymd_and_hms(2023, 9, 1, 16, 0, 0).unwrap();
        let pacific = resolve_time_zone("Pacific Time (US & Canada)").unwrap();
        let mountain = resolve_time_zone("Mountain Time (US & Canada)").unwrap();

        assert_eq!(format_time_of_day(at, &pacific), "9:00am PDT");
        assert_eq!(format_time_of_day(at, &mountain), "10:00am MDT");
    }
}
