//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if the nanosecond count overflows
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a tick rate into the period of one tick.
///
/// Returns `None` if the rate is not a finite positive number.
pub fn rate_to_period(rate_hz: f64) -> Option<std::time::Duration> {
    if rate_hz.is_finite() && rate_hz > 0.0 {
        Some(std::time::Duration::from_secs_f64(1.0 / rate_hz))
    } else {
        None
    }
}
