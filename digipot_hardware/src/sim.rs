//! Simulated collaborators: a bus and display that print to stdout, and a
//! scripted encoder that produces the raw edges of clicks and presses.

use std::sync::Arc;

use digipot_traits::{EdgeSource, InputEdge, InputLine, Level, LineDisplay, PotBus, Timestamp};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bus that records writes and prints each one.
#[derive(Debug, Clone)]
pub struct SimulatedBus {
    channels: usize,
    max_ohms: i32,
    max_steps: u32,
    writes: Vec<(usize, [u8; 2])>,
    quiet: bool,
}

impl SimulatedBus {
    pub fn new(channels: usize, max_ohms: i32, max_steps: u32) -> Self {
        Self {
            channels,
            max_ohms,
            max_steps: max_steps.max(1),
            writes: Vec::new(),
            quiet: false,
        }
    }

    /// Record only; print nothing.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn writes(&self) -> &[(usize, [u8; 2])] {
        &self.writes
    }

    /// The line printed for one write.
    pub fn describe(&self, channel: usize, step: u8) -> String {
        let approx = f64::from(step) * f64::from(self.max_ohms) / f64::from(self.max_steps);
        format!("Pot {} | Step: {step} | Approx: {approx:.1} Ohms", channel + 1)
    }
}

impl PotBus for SimulatedBus {
    fn write(&mut self, channel: usize, bytes: [u8; 2]) -> Result<(), BoxError> {
        if channel >= self.channels {
            return Err(Box::new(HwError::UnknownChannel(channel)));
        }
        tracing::debug!(channel, command = bytes[0], step = bytes[1], "simulated spi write");
        self.writes.push((channel, bytes));
        if !self.quiet {
            println!("{}", self.describe(channel, bytes[1]));
        }
        Ok(())
    }
}

/// Display that prints a line whenever its text changes.
#[derive(Debug, Clone)]
pub struct ConsoleDisplay {
    lines: Vec<String>,
    quiet: bool,
}

impl ConsoleDisplay {
    pub fn new(lines: usize) -> Self {
        Self {
            lines: vec![String::new(); lines],
            quiet: false,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(|s| s.trim_end())
    }
}

impl LineDisplay for ConsoleDisplay {
    fn lines(&self) -> usize {
        self.lines.len()
    }

    fn put_line(&mut self, line: usize, text: &str) -> Result<(), BoxError> {
        let slot = self
            .lines
            .get_mut(line)
            .ok_or_else(|| HwError::Io(std::io::Error::other(format!("no display line {line}"))))?;
        if slot.as_str() != text {
            text.clone_into(slot);
            if !self.quiet {
                println!("LCD{line} | {}", text.trim_end());
            }
        }
        Ok(())
    }
}

/// Timing used when turning commands into edges, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptTiming {
    /// Between the four edges of one click.
    pub edge_us: u64,
    /// After a normal click.
    pub slow_gap_us: u64,
    /// After a fast click.
    pub fast_gap_us: u64,
    /// How long a plain press is held.
    pub tap_us: u64,
    /// Quiet time after a release, longer than any button debounce.
    pub settle_us: u64,
}

impl Default for ScriptTiming {
    fn default() -> Self {
        Self {
            edge_us: 1_000,
            slow_gap_us: 250_000,
            fast_gap_us: 20_000,
            tap_us: 50_000,
            settle_us: 300_000,
        }
    }
}

/// One scripted user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimCommand {
    Clockwise { clicks: u32, fast: bool },
    CounterClockwise { clicks: u32, fast: bool },
    Press,
    Hold { ms: u64 },
    Wait { ms: u64 },
}

/// Queues the raw edges a real encoder would produce for scripted actions,
/// on a virtual timeline.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEncoder {
    timing: ScriptTiming,
    now: Timestamp,
    pending: Vec<InputEdge>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp the next edge will carry.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Move the timeline forward to `now` if it lags behind; never backwards.
    pub fn catch_up(&mut self, now: Timestamp) -> &mut Self {
        self.now = self.now.max(now);
        self
    }

    pub fn pending(&self) -> &[InputEdge] {
        &self.pending
    }

    pub fn take_edges(&mut self) -> Vec<InputEdge> {
        std::mem::take(&mut self.pending)
    }

    pub fn apply(&mut self, cmd: SimCommand) -> &mut Self {
        match cmd {
            SimCommand::Clockwise { clicks, fast } => self.clicks(clicks, true, fast),
            SimCommand::CounterClockwise { clicks, fast } => self.clicks(clicks, false, fast),
            SimCommand::Press => self.hold_for(self.timing.tap_us),
            SimCommand::Hold { ms } => self.hold_for(ms.saturating_mul(1_000)),
            SimCommand::Wait { ms } => {
                self.now = self.now.add_micros(ms.saturating_mul(1_000));
                self
            }
        }
    }

    pub fn cw(&mut self, clicks: u32) -> &mut Self {
        self.clicks(clicks, true, false)
    }

    pub fn ccw(&mut self, clicks: u32) -> &mut Self {
        self.clicks(clicks, false, false)
    }

    pub fn fast_cw(&mut self, clicks: u32) -> &mut Self {
        self.clicks(clicks, true, true)
    }

    pub fn press(&mut self) -> &mut Self {
        self.hold_for(self.timing.tap_us)
    }

    pub fn hold(&mut self, ms: u64) -> &mut Self {
        self.hold_for(ms.saturating_mul(1_000))
    }

    fn clicks(&mut self, clicks: u32, clockwise: bool, fast: bool) -> &mut Self {
        // clockwise walks 0 -> 1 -> 3 -> 2 -> 0: B rises first
        let (lead, trail) = if clockwise {
            (InputLine::EncoderB, InputLine::EncoderA)
        } else {
            (InputLine::EncoderA, InputLine::EncoderB)
        };
        let gap = if fast {
            self.timing.fast_gap_us
        } else {
            self.timing.slow_gap_us
        };
        for _ in 0..clicks {
            for (line, level) in [
                (lead, Level::High),
                (trail, Level::High),
                (lead, Level::Low),
                (trail, Level::Low),
            ] {
                self.pending.push(InputEdge::new(line, level, self.now));
                self.now = self.now.add_micros(self.timing.edge_us);
            }
            self.now = self.now.add_micros(gap);
        }
        self
    }

    fn hold_for(&mut self, us: u64) -> &mut Self {
        self.pending
            .push(InputEdge::new(InputLine::Button, Level::High, self.now));
        self.now = self.now.add_micros(us);
        self.pending
            .push(InputEdge::new(InputLine::Button, Level::Low, self.now));
        self.now = self.now.add_micros(self.timing.settle_us);
        self
    }
}

impl EdgeSource for ScriptedEncoder {
    /// Deliver every edge queued so far, in order, on the calling thread.
    fn start(&mut self, on_edge: Arc<dyn Fn(InputEdge) + Send + Sync>) -> Result<(), BoxError> {
        for edge in self.take_edges() {
            on_edge(edge);
        }
        Ok(())
    }
}
