//! Duration conversions for logs and reports.

use std::time::Duration;

/// Converts a duration to fractional milliseconds.
///
/// Reports carry milliseconds; microsecond precision survives in the fraction.
pub fn duration_as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Human-readable duration for summaries: `850µs`, `12.34ms`, `3.21s`.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_millis(1) {
        format!("{}µs", duration.as_micros())
    } else if duration < Duration::from_secs(1) {
        format!("{:.2}ms", duration_as_ms(duration))
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}
