//! Human-readable formatting for elapsed durations.
//!
//! Search results report how long the query took as a compact string derived
//! from a monotonic nanosecond measurement: `"812ns"`, `"123μs"`, `"4.56ms"`,
//! `"1.20s"`.

use std::time::Duration;

const NS_PER_US: u128 = 1_000;
const NS_PER_MS: u128 = 1_000_000;
const NS_PER_S: u128 = 1_000_000_000;

/// Format a nanosecond count as a short human-readable duration.
///
/// Sub-millisecond values render as integers; milliseconds and seconds keep
/// two decimals.
///
/// # Examples
///
/// ```
/// use falcata::util::elapsed::format_nanos;
///
/// assert_eq!(format_nanos(812), "812ns");
/// assert_eq!(format_nanos(123_000), "123μs");
/// assert_eq!(format_nanos(4_560_000), "4.56ms");
/// assert_eq!(format_nanos(1_200_000_000), "1.20s");
/// ```
pub fn format_nanos(nanos: u128) -> String {
    if nanos < NS_PER_US {
        format!("{nanos}ns")
    } else if nanos < NS_PER_MS {
        format!("{}μs", nanos / NS_PER_US)
    } else if nanos < NS_PER_S {
        format!("{:.2}ms", nanos as f64 / NS_PER_MS as f64)
    } else {
        format!("{:.2}s", nanos as f64 / NS_PER_S as f64)
    }
}

/// Format a [`Duration`] with the same rules as [`format_nanos`].
pub fn format_duration(duration: Duration) -> String {
    format_nanos(duration.as_nanos())
}
