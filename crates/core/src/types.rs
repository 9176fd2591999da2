/// Phone numbers are the natural key for profiles, fees and attendance.
pub type Phone = String;

/// Opaque class identifier, e.g. `"class-1"`.
pub type ClassId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Message timestamps travel as milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Returns `true` when the value is empty after trimming whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
