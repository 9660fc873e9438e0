//! Dispatch loop: the single owner of controller, sink and display.
//!
//! Edges arrive over a crossbeam channel from whatever thread the GPIO layer
//! uses; the loop interleaves them with a periodic `Tick` and performs every
//! `Intent` the controller returns. A bus failure ends the loop with an
//! error. Display failures are logged and counted only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use digipot_traits::{InputEdge, LineDisplay, PotBus};

use crate::controller::PotController;
use crate::error::Result;
use crate::event::{Event, Intent};
use crate::hw_error::map_display_error;
use crate::sink::PotSink;

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub edges: u64,
    pub ticks: u64,
    pub writes: u64,
    pub skipped_writes: u64,
    pub display_updates: u64,
    pub display_errors: u64,
}

pub struct Runner<B: PotBus, D: LineDisplay> {
    controller: PotController,
    sink: PotSink<B>,
    display: D,
    tick: Duration,
    stats: RunStats,
}

impl<B: PotBus, D: LineDisplay> core::fmt::Debug for Runner<B, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Runner")
            .field("page", &self.controller.page())
            .field("target_ohms", &self.controller.target_ohms())
            .field("tick", &self.tick)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<B: PotBus, D: LineDisplay> Runner<B, D> {
    pub fn new(controller: PotController, sink: PotSink<B>, display: D, tick: Duration) -> Self {
        Self {
            controller,
            sink,
            display,
            tick: tick.max(Duration::from_millis(1)),
            stats: RunStats::default(),
        }
    }

    pub fn controller(&self) -> &PotController {
        &self.controller
    }

    pub fn sink(&self) -> &PotSink<B> {
        &self.sink
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn into_parts(self) -> (PotController, PotSink<B>, D) {
        (self.controller, self.sink, self.display)
    }

    /// Dispatch one event and carry out the resulting intents in order.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Tick => self.stats.ticks += 1,
            _ => self.stats.edges += 1,
        }
        for intent in self.controller.dispatch(event) {
            match intent {
                Intent::WriteStep { channel, step } => {
                    match self.sink.write_step(channel, step) {
                        Ok(Some(approx)) => {
                            self.stats.writes += 1;
                            self.controller.confirm_write(channel, approx);
                        }
                        Ok(None) => self.stats.skipped_writes += 1,
                        Err(e) => {
                            tracing::error!(channel, step, error = %e, "bus write failed");
                            return Err(e);
                        }
                    }
                }
                Intent::SetDisplayLine { line, text } => {
                    match self.display.put_line(line, &text) {
                        Ok(()) => self.stats.display_updates += 1,
                        Err(e) => {
                            let err = map_display_error(e.as_ref());
                            tracing::warn!(line, error = %err, "display update failed");
                            self.stats.display_errors += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Run until `shutdown` is set or every sender of `rx` is dropped.
    ///
    /// The display is rendered once on start and flushed once more on the
    /// way out so the last state is always shown.
    pub fn run(&mut self, rx: &xch::Receiver<InputEdge>, shutdown: &AtomicBool) -> Result<RunStats> {
        tracing::info!(tick_ms = self.tick.as_millis() as u64, "dispatch loop start");
        self.handle(Event::Tick)?;
        let mut next_tick = Instant::now() + self.tick;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested");
                break;
            }
            let now = Instant::now();
            if now >= next_tick {
                self.handle(Event::Tick)?;
                next_tick = now + self.tick;
                continue;
            }
            match rx.recv_timeout(next_tick - now) {
                Ok(edge) => self.handle(Event::from(edge))?,
                Err(xch::RecvTimeoutError::Timeout) => {}
                Err(xch::RecvTimeoutError::Disconnected) => {
                    tracing::debug!("input source closed");
                    break;
                }
            }
        }

        self.handle(Event::Tick)?;
        tracing::info!(
            edges = self.stats.edges,
            writes = self.stats.writes,
            page = %self.controller.page(),
            ohms = self.controller.target_ohms(),
            "dispatch loop stop"
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkCfg;
    use crate::display::HEADER;
    use crate::mocks::{FailingBus, MemoryDisplay, RecordingBus};
    use crate::units::UnitConverter;
    use digipot_traits::{Level, Timestamp};

    fn runner<B: PotBus>(bus: B) -> Runner<B, MemoryDisplay> {
        Runner::new(
            PotController::builder().try_build().unwrap(),
            PotSink::new(bus, UnitConverter::new(10_000, 128), SinkCfg::default()),
            MemoryDisplay::default(),
            Duration::from_millis(5),
        )
    }

    fn press(us: u64) -> Event {
        Event::ButtonEdge {
            level: Level::High,
            timestamp: Timestamp::from_micros(us),
        }
    }

    #[test]
    fn tick_renders_to_display() {
        let mut r = runner(RecordingBus::default());
        r.handle(Event::Tick).unwrap();
        assert_eq!(r.display().line(HEADER), "Select a Pot:");
        assert_eq!(r.stats().display_updates, 4);
    }

    #[test]
    fn bus_failure_ends_the_session() {
        let mut r = runner(FailingBus::new("unplugged"));
        // MainSelect -> VarConst -> PotAdjust, then press to write
        r.handle(press(0)).unwrap();
        r.handle(press(300_000)).unwrap();
        assert!(r.handle(press(600_000)).is_err());
    }

    #[test]
    fn disconnected_input_stops_loop() {
        let mut r = runner(RecordingBus::default());
        let (tx, rx) = xch::unbounded();
        drop(tx);
        let stats = r.run(&rx, &AtomicBool::new(false)).unwrap();
        assert_eq!(stats.edges, 0);
        assert!(stats.ticks >= 2);
    }
}
