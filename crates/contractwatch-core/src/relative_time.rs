//! Human "time ago" strings for contract and notification timestamps.

use chrono::{DateTime, Utc};

/// Format `then` relative to `now`.
///
/// Under a minute (including any future timestamp, which clock skew between
/// client and server produces) is "just now"; then minutes, hours, and days
/// up to a week. Anything older prints the date.
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let mins = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if elapsed.num_seconds() < 60 {
        "just now".to_string()
    } else if (1..60).contains(&mins) {
        format!("{mins}m ago")
    } else if (1..24).contains(&hours) {
        format!("{hours}h ago")
    } else if (1..7).contains(&days) {
        format!("{days}d ago")
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-02-21T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn buckets() {
        let now = now();
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
    }

    #[test]
    fn old_dates_print_calendar_date() {
        let now = now();
        assert_eq!(
            format_relative_time(now - Duration::days(10), now),
            "2026-02-11"
        );
    }

    #[test]
    fn future_timestamps_are_just_now() {
        let now = now();
        assert_eq!(format_relative_time(now + Duration::seconds(10), now), "just now");
        assert_eq!(format_relative_time(now + Duration::hours(2), now), "just now");
    }
}
