//! Display formatting for cooldowns and uptimes.

use std::time::Duration;

/// Format a remaining cooldown for status output.
///
/// - `>= 60s`: `M:SS`
/// - `>= 10s`: whole seconds plus `suffix`
/// - `< 10s`: one decimal place plus `suffix`
/// - zero: `zero_label`
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use hotbar_types::formatting::format_countdown;
/// assert_eq!(format_countdown(Duration::from_millis(75_300), "s", "ready"), "1:15");
/// assert_eq!(format_countdown(Duration::from_millis(15_700), "s", "ready"), "16s");
/// assert_eq!(format_countdown(Duration::from_millis(4_800), "s", "ready"), "4.8s");
/// assert_eq!(format_countdown(Duration::ZERO, "s", "ready"), "ready");
/// ```
pub fn format_countdown(remaining: Duration, suffix: &str, zero_label: &str) -> String {
    let secs = remaining.as_secs_f64();
    if secs <= 0.0 {
        return zero_label.to_string();
    }
    if secs >= 60.0 {
        let whole = secs.floor() as u64;
        format!("{}:{:02}", whole / 60, whole % 60)
    } else if secs >= 10.0 {
        format!("{:.0}{}", secs, suffix)
    } else {
        format!("{:.1}{}", secs, suffix)
    }
}

/// Format seconds as `M:SS`.
///
/// # Examples
/// ```
/// use hotbar_types::formatting::format_duration;
/// assert_eq!(format_duration(125), "2:05");
/// assert_eq!(format_duration(0), "0:00");
/// ```
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
