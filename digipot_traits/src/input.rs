//! Raw input edges as delivered by the GPIO layer.

use crate::clock::Timestamp;

/// Logical level of an input line after any active-low inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    #[inline]
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// The three lines of a push-button rotary encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLine {
    EncoderA,
    EncoderB,
    Button,
}

/// One electrical transition with its monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdge {
    pub line: InputLine,
    pub level: Level,
    pub timestamp: Timestamp,
}

impl InputEdge {
    pub fn new(line: InputLine, level: Level, timestamp: Timestamp) -> Self {
        Self {
            line,
            level,
            timestamp,
        }
    }
}
