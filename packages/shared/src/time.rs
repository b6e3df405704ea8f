use chrono::{Local, NaiveDateTime};

/// Current wall-clock time in the local timezone, without offset.
///
/// Chat servers exchange local date-times, so this is the value to compare
/// inbound message timestamps against.
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Format a timestamp as `HH:MM:SS` for compact console output.
pub fn format_clock(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS` for date dividers.
pub fn format_date_time(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}
