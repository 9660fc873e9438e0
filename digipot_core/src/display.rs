//! Dirty-line bookkeeping for the deferred display flush.

/// Title / page header.
pub const HEADER: usize = 0;
/// Primary value: selection or resistance.
pub const OHMS: usize = 1;
/// Secondary choice or confirmation.
pub const STATUS: usize = 2;
/// Detail line (approximate value after a write).
pub const DETAIL: usize = 3;
/// Lines on the character display.
pub const LINE_COUNT: usize = 4;

/// Set of display lines waiting for the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyLines(u8);

impl DirtyLines {
    pub const fn clean() -> Self {
        Self(0)
    }

    pub fn mark(&mut self, line: usize) {
        if line < LINE_COUNT {
            self.0 |= 1 << line;
        }
    }

    pub fn mark_all(&mut self) {
        self.0 = (1 << LINE_COUNT) - 1;
    }

    pub fn is_dirty(&self, line: usize) -> bool {
        line < LINE_COUNT && self.0 & (1 << line) != 0
    }

    pub fn is_clean(&self) -> bool {
        self.0 == 0
    }

    /// Dirty line indexes in ascending order; the set is cleared.
    pub fn take(&mut self) -> Vec<usize> {
        let bits = std::mem::take(&mut self.0);
        (0..LINE_COUNT).filter(|l| bits & (1 << l) != 0).collect()
    }
}
