use chrono::{DateTime, FixedOffset, Utc};

pub fn now_in(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

pub fn format_datetime_local(datetime: DateTime<Utc>, offset: FixedOffset) -> String {
    datetime.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_time_local(datetime: DateTime<Utc>, offset: FixedOffset) -> String {
    datetime.with_timezone(&offset).format("%H:%M:%S").to_string()
}

/// `5` -> `5:00 AM`, `13` -> `1:00 PM`, `24` -> `12:00 AM`.
pub fn format_hour(hour: u32) -> String {
    let hour = hour % 24;
    let (display, suffix) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };
    format!("{}:00 {}", display, suffix)
}
