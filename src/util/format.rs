use chrono::{DateTime, Utc};
use url::Url;

/// Format a unix timestamp as relative time
pub fn relative_time(timestamp: i64) -> String {
    relative_to(timestamp, Utc::now().timestamp())
}

fn relative_to(ts: i64, now: i64) -> String {
    let diff = now - ts;

    // Future dates (clock skew on the API side)
    if diff < 0 {
        return "now".to_string();
    }

    // Less than 1 hour
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }

    // Less than 24 hours
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }

    // Less than 7 days
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    // Older than 7 days - show date
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%b %d").to_string())
        .unwrap_or_default()
}

/// Compact display form of a story link: the hostname with a leading `www.`
/// stripped. Unparseable input comes back unchanged so the row still shows
/// *something* the user can recognize.
pub fn host_for_display(url: &str) -> String {
    match Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => url.to_string(),
    }
}
