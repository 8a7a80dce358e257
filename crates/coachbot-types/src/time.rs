use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// `dd/MM/yyyy HH:mm`, the format every timestamp is displayed in
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

const NAIVE_SERVER_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn format_display<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DISPLAY_FORMAT).to_string()
}

pub fn now_display() -> String {
    format_display(&Local::now())
}

/// Reformat a backend timestamp for display.
///
/// RFC 3339 values are shown in local time, naive values as-is. Anything
/// unparseable is returned unchanged.
pub fn format_server_timestamp(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return format_display(&parsed.with_timezone(&Local));
    }

    NAIVE_SERVER_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| raw.to_string())
}
