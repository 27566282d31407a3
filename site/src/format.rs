//! Human readable sizes and times.

use chrono::{DateTime, Utc};

const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];

/// Format a byte count with binary multiples, e.g. `1.5 KB` for 1536.
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Describe how long before `reference` the instant `ts` was.
pub fn relative_time(ts: DateTime<Utc>, reference: DateTime<Utc>) -> String {
    let elapsed = reference.signed_duration_since(ts);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if hours < 1 {
        plural(minutes, "minute")
    } else if days < 1 {
        plural(hours, "hour")
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        plural(days / 365, "year")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1024), "1.0 KB");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_relative_time() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let cases = [
            (Duration::seconds(30), "just now"),
            (Duration::minutes(1), "1 minute ago"),
            (Duration::minutes(45), "45 minutes ago"),
            (Duration::hours(1), "1 hour ago"),
            (Duration::hours(23), "23 hours ago"),
            (Duration::days(2), "2 days ago"),
            (Duration::days(65), "2 months ago"),
            (Duration::days(800), "2 years ago"),
        ];
        for (ago, expected) in cases {
            assert_eq!(relative_time(reference - ago, reference), expected);
        }
    }

    #[test]
    fn test_future_is_just_now() {
        let reference = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(
            relative_time(reference + Duration::hours(3), reference),
            "just now"
        );
    }
}
