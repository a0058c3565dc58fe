use chrono::{SecondsFormat, TimeZone, Utc};

/// Formats a millisecond timestamp as an RFC 3339 UTC string.
/// Out of range timestamps are rendered as the raw number.
pub fn format_timestamp(ts: i64) -> String {
    match Utc.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => ts.to_string(),
    }
}
