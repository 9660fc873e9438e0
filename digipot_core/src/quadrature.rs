//! Gray-code decoder for a mechanical rotary encoder.
//!
//! The combined state is `(level_a << 1) | level_b`. One detent walks the
//! full cycle `0 -> 1 -> 3 -> 2 -> 0` clockwise (the reverse counter-clockwise),
//! producing two edges per pin. A detent is reported only when a valid
//! transition lands back on the home state after the shaft has travelled at
//! least half a cycle in one net direction, so a bounce that reverses before
//! completing (`0 -> 1 -> 0`) reports nothing.

use digipot_traits::{Level, Timestamp};

/// Combined state of a resting encoder.
pub const HOME: u8 = 0;

/// Net valid transitions needed for a return to home to count as a detent.
const MIN_TRAVEL: i8 = 2;

/// Direction of a valid transition, indexed by `(previous << 2) | next`.
/// +1 clockwise, -1 counter-clockwise, 0 for no change or an invalid jump.
const TRANSITIONS: [i8; 16] = [
    0, 1, -1, 0, // from 0
    -1, 0, 0, 1, // from 1
    1, 0, 0, -1, // from 2
    0, -1, 1, 0, // from 3
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderPin {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    /// +1 for clockwise, -1 for counter-clockwise.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

/// One completed mechanical click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detent {
    pub direction: Direction,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    level_a: Level,
    level_b: Level,
    state: u8,
    travel: i8,
    last_detent: Option<Timestamp>,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    pub fn new() -> Self {
        Self {
            level_a: Level::Low,
            level_b: Level::Low,
            state: HOME,
            travel: 0,
            last_detent: None,
        }
    }

    /// Current combined state, always in `0..=3`.
    pub fn state(&self) -> u8 {
        self.state
    }

    pub fn levels(&self) -> (Level, Level) {
        (self.level_a, self.level_b)
    }

    /// Timestamp of the most recent detent, if any since the last reset.
    pub fn last_detent(&self) -> Option<Timestamp> {
        self.last_detent
    }

    /// Forget detent timing; electrical state is kept.
    pub fn reset_timing(&mut self) {
        self.last_detent = None;
    }

    /// Feed one raw edge. Returns a detent when this edge completes a click.
    pub fn on_edge(&mut self, pin: EncoderPin, level: Level, timestamp: Timestamp) -> Option<Detent> {
        let next = match pin {
            EncoderPin::A => (level.bit() << 1) | self.level_b.bit(),
            EncoderPin::B => (self.level_a.bit() << 1) | level.bit(),
        };
        self.on_state(next, timestamp)
    }

    /// Move to combined state `next` (low two bits are used). Pairs that are
    /// not a single Gray step are ignored, but the stored state still follows
    /// the pins so later transitions are judged from the real position.
    pub fn on_state(&mut self, next: u8, timestamp: Timestamp) -> Option<Detent> {
        let next = next & 0b11;
        let previous = self.state;
        self.state = next;
        self.level_a = Level::from(next & 0b10 != 0);
        self.level_b = Level::from(next & 0b01 != 0);

        let delta = TRANSITIONS[usize::from((previous << 2) | next)];
        if delta == 0 {
            if previous != next {
                tracing::trace!(previous, next, "invalid encoder transition ignored");
            }
            if next == HOME {
                self.travel = 0;
            }
            return None;
        }

        self.travel = self.travel.saturating_add(delta);
        if next != HOME {
            return None;
        }

        let travel = std::mem::take(&mut self.travel);
        if travel.abs() < MIN_TRAVEL {
            tracing::trace!(travel, "partial rotation returned home");
            return None;
        }
        let direction = if travel > 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        };
        self.last_detent = Some(timestamp);
        Some(Detent {
            direction,
            timestamp,
        })
    }

    /// Walk a sequence of combined states, `spacing_us` apart, collecting
    /// every detent produced.
    pub fn feed_states(&mut self, states: &[u8], start: Timestamp, spacing_us: u64) -> Vec<Detent> {
        let mut t = start;
        let mut out = Vec::new();
        for &s in states {
            out.extend(self.on_state(s, t));
            t = t.add_micros(spacing_us);
        }
        out
    }
}
