//! Inputs to and outputs from `PotController::dispatch`.

use digipot_traits::{InputEdge, InputLine, Level, Timestamp};

use crate::quadrature::EncoderPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    RotationEdge {
        pin: EncoderPin,
        level: Level,
        timestamp: Timestamp,
    },
    /// `High` is a press, `Low` a release (levels are already normalized).
    ButtonEdge { level: Level, timestamp: Timestamp },
    /// Periodic display flush.
    Tick,
}

impl From<InputEdge> for Event {
    fn from(e: InputEdge) -> Self {
        match e.line {
            InputLine::EncoderA => Event::RotationEdge {
                pin: EncoderPin::A,
                level: e.level,
                timestamp: e.timestamp,
            },
            InputLine::EncoderB => Event::RotationEdge {
                pin: EncoderPin::B,
                level: e.level,
                timestamp: e.timestamp,
            },
            InputLine::Button => Event::ButtonEdge {
                level: e.level,
                timestamp: e.timestamp,
            },
        }
    }
}

/// A side effect requested by the controller. The runner performs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    WriteStep { channel: usize, step: u32 },
    SetDisplayLine { line: usize, text: String },
}
