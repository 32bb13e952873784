//! Compact display timestamps for transcript lines and chapters.

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up.
///
/// The leading component is never zero-padded; the rest always are.
/// Fractional seconds are truncated and negative or non-finite input
/// is treated as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
