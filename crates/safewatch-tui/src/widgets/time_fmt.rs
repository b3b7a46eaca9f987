//! Compact relative-time formatting for table columns.

use chrono::{DateTime, Utc};

/// Format the distance between `then` and `now` as "12s", "4m", "2h",
/// or "3d". Future timestamps clamp to "0s".
pub fn fmt_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn buckets_scale_with_age() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).single();
        let now = now.expect("valid timestamp");

        assert_eq!(fmt_ago(now - chrono::Duration::seconds(45), now), "45s");
        assert_eq!(fmt_ago(now - chrono::Duration::minutes(7), now), "7m");
        assert_eq!(fmt_ago(now - chrono::Duration::hours(5), now), "5h");
        assert_eq!(fmt_ago(now - chrono::Duration::days(2), now), "2d");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        let now = Utc::now();
        assert_eq!(fmt_ago(now + chrono::Duration::seconds(30), now), "0s");
    }
}
