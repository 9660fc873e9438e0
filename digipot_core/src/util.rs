//! Small time and text helpers shared across the crate.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of microseconds in one millisecond.
pub const MICROS_PER_MILLI: u64 = 1_000;

/// Convert milliseconds to microseconds, saturating on overflow.
#[inline]
pub fn millis_to_micros(ms: u64) -> u64 {
    ms.saturating_mul(MICROS_PER_MILLI)
}

/// Pad or truncate `text` to exactly `width` characters.
pub fn fit_line(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}
