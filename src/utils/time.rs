use chrono::NaiveDate;

/// The standard way of converting a day to a string in habitrack.
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format written by browsers' `Date.toDateString()`, e.g. `Sun Oct 18 2026`. Only ever read, so
/// data saved by the old web tracker keeps its streak markers.
pub const LEGACY_DAY_FORMAT: &str = "%a %b %d %Y";

pub fn date_to_day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Accepts the day key format as well as the legacy one.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DAY_KEY_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, LEGACY_DAY_FORMAT))
        .ok()
}
