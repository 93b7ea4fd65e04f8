use chrono::{DateTime, Utc};

/// Fuzzy relative time in the style of the jQuery timeago plugin,
/// e.g. "about an hour ago" or "3 days from now".
pub fn timeago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let suffix = if delta.num_milliseconds() < 0 {
        "from now"
    } else {
        "ago"
    };

    let seconds = delta.num_seconds().unsigned_abs() as f64;
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    let years = days / 365.0;

    let words = if seconds < 45.0 {
        "less than a minute".to_string()
    } else if seconds < 90.0 {
        "about a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes.round())
    } else if minutes < 90.0 {
        "about an hour".to_string()
    } else if hours < 24.0 {
        format!("about {} hours", hours.round())
    } else if hours < 42.0 {
        "a day".to_string()
    } else if days < 30.0 {
        format!("{} days", days.round())
    } else if days < 45.0 {
        "about a month".to_string()
    } else if days < 365.0 {
        format!("{} months", (days / 30.0).round())
    } else if years < 1.5 {
        "about a year".to_string()
    } else {
        format!("{} years", years.round())
    };
    format!("{words} {suffix}")
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ago(delta: Duration) -> String {
        let now = Utc::now();
        timeago(now - delta, now)
    }

    #[test]
    fn buckets() {
        assert_eq!(ago(Duration::seconds(10)), "less than a minute ago");
        assert_eq!(ago(Duration::seconds(60)), "about a minute ago");
        assert_eq!(ago(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(Duration::minutes(60)), "about an hour ago");
        assert_eq!(ago(Duration::hours(3)), "about 3 hours ago");
        assert_eq!(ago(Duration::hours(30)), "a day ago");
        assert_eq!(ago(Duration::days(4)), "4 days ago");
        assert_eq!(ago(Duration::days(35)), "about a month ago");
        assert_eq!(ago(Duration::days(90)), "3 months ago");
        assert_eq!(ago(Duration::days(400)), "about a year ago");
        assert_eq!(ago(Duration::days(365 * 3)), "3 years ago");
    }

    #[test]
    fn future_times() {
        assert_eq!(ago(Duration::days(-2)), "2 days from now");
    }
}
