use std::time::Duration;

use digipot_traits::{InputLine, Level};

/// Logical level for a raw pin reading. With pull-up wiring (`active_low`)
/// an idle line reads high, so the reading is inverted: the encoder then
/// rests at state 0 and a pressed button reports `High`.
#[inline]
pub fn normalize_level(raw_high: bool, active_low: bool) -> Level {
    Level::from(raw_high != active_low)
}

/// Driver-level debounce for one line. Only the button is filtered: the
/// encoder's edges are a few ms apart at speed and the decoder already
/// absorbs their bounce.
pub fn glitch_filter(line: InputLine, glitch_us: Option<u64>) -> Option<Duration> {
    match line {
        InputLine::Button => glitch_us.filter(|&us| us > 0).map(Duration::from_micros),
        InputLine::EncoderA | InputLine::EncoderB => None,
    }
}
