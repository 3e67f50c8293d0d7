use chrono::{DateTime, Utc};

/// Relative "last active" label for a profile timestamp
///
/// Future timestamps read as "Just now"; a missing timestamp as "A while ago".
pub fn last_active_label(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let updated_at = match updated_at {
        Some(ts) => ts,
        None => return "A while ago".to_string(),
    };

    let hours = (now - updated_at).num_hours();
    let days = hours / 24;

    match hours {
        h if h < 1 => "Just now".to_string(),
        1 => "1 hour ago".to_string(),
        h if h < 24 => format!("{} hours ago", h),
        _ if days == 1 => "1 day ago".to_string(),
        _ if days < 7 => format!("{} days ago", days),
        _ => "A while ago".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn label_for(ago: Duration) -> String {
        last_active_label(Some(now() - ago), now())
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(label_for(Duration::minutes(59)), "Just now");
        assert_eq!(label_for(Duration::minutes(60)), "1 hour ago");
        assert_eq!(label_for(Duration::hours(23)), "23 hours ago");
        assert_eq!(label_for(Duration::hours(24)), "1 day ago");
        assert_eq!(label_for(Duration::days(6)), "6 days ago");
        assert_eq!(label_for(Duration::days(7)), "A while ago");
    }

    #[test]
    fn test_future_and_missing() {
        assert_eq!(label_for(Duration::hours(-3)), "Just now");
        assert_eq!(last_active_label(None, now()), "A while ago");
    }
}
