//! In-memory bus and display used by tests and the simulator.

use std::collections::BTreeMap;

use digipot_traits::{LineDisplay, PotBus};

use crate::display::LINE_COUNT;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Bus that records every write.
#[derive(Debug, Default, Clone)]
pub struct RecordingBus {
    writes: Vec<(usize, [u8; 2])>,
}

impl RecordingBus {
    pub fn writes(&self) -> &[(usize, [u8; 2])] {
        &self.writes
    }

    /// Last step written to `channel`, if any.
    pub fn last_step(&self, channel: usize) -> Option<u8> {
        self.writes
            .iter()
            .rev()
            .find(|(c, _)| *c == channel)
            .map(|(_, b)| b[1])
    }
}

impl PotBus for RecordingBus {
    fn write(&mut self, channel: usize, bytes: [u8; 2]) -> Result<(), BoxError> {
        self.writes.push((channel, bytes));
        Ok(())
    }
}

/// Bus whose every write fails.
#[derive(Debug, Clone)]
pub struct FailingBus {
    message: String,
}

impl FailingBus {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl PotBus for FailingBus {
    fn write(&mut self, _channel: usize, _bytes: [u8; 2]) -> Result<(), BoxError> {
        Err(Box::new(std::io::Error::other(self.message.clone())))
    }
}

/// Display that keeps the current text of each line and counts updates.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    lines: Vec<String>,
    updates: BTreeMap<usize, usize>,
}

impl Default for MemoryDisplay {
    fn default() -> Self {
        Self {
            lines: vec![String::new(); LINE_COUNT],
            updates: BTreeMap::new(),
        }
    }
}

impl MemoryDisplay {
    pub fn line(&self, line: usize) -> &str {
        self.lines.get(line).map_or("", |s| s.trim_end())
    }

    /// How many times `line` was written.
    pub fn updates(&self, line: usize) -> usize {
        self.updates.get(&line).copied().unwrap_or(0)
    }
}

impl LineDisplay for MemoryDisplay {
    fn lines(&self) -> usize {
        self.lines.len()
    }

    fn put_line(&mut self, line: usize, text: &str) -> Result<(), BoxError> {
        let slot = self
            .lines
            .get_mut(line)
            .ok_or_else(|| std::io::Error::other(format!("no display line {line}")))?;
        text.clone_into(slot);
        *self.updates.entry(line).or_default() += 1;
        Ok(())
    }
}
