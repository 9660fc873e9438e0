//! Bring-up sweep: write each preset, then every step from 0 to
//! `max_steps`, pausing on each so the wiper can be measured.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use digipot_traits::{Clock, PotBus};

use crate::config::Preset;
use crate::error::Result;
use crate::sink::PotSink;

/// Longest single sleep, so a shutdown request is noticed during long dwells.
const DWELL_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SweepPhase {
    Presets,
    Steps,
}

impl SweepPhase {
    pub fn name(self) -> &'static str {
        match self {
            SweepPhase::Presets => "presets",
            SweepPhase::Steps => "steps",
        }
    }
}

/// One write the sweep performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub phase: SweepPhase,
    pub step: u32,
    pub approx_ohms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepCfg {
    /// Zero-based wiper channel.
    pub channel: usize,
    pub preset_dwell: Duration,
    pub step_dwell: Duration,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            preset_dwell: Duration::from_secs(10),
            step_dwell: Duration::from_secs(2),
        }
    }
}

/// Steps to visit, in order: one per preset, then `0..=max_steps`.
pub fn sweep_plan(
    presets: &[Preset],
    max_steps: u32,
    step_of: impl Fn(i32) -> u32,
) -> Vec<(SweepPhase, u32)> {
    presets
        .iter()
        .map(|p| (SweepPhase::Presets, step_of(p.ohms)))
        .chain((0..=max_steps).map(|s| (SweepPhase::Steps, s)))
        .collect()
}

/// Run the sweep on `sink`, calling `on_point` after each write.
///
/// Stops early, without error, once `shutdown` is set. Skipped writes (bad
/// channel or step) are not reported. Returns the number of points written.
pub fn run_sweep<B, C, F>(
    sink: &mut PotSink<B>,
    presets: &[Preset],
    cfg: &SweepCfg,
    clock: &C,
    shutdown: &AtomicBool,
    mut on_point: F,
) -> Result<usize>
where
    B: PotBus,
    C: Clock,
    F: FnMut(SweepPoint),
{
    let conv = *sink.converter();
    let plan = sweep_plan(presets, conv.max_steps(), |ohms| conv.target_step(ohms));
    tracing::info!(channel = cfg.channel, points = plan.len(), "sweep start");

    let mut written = 0usize;
    for (phase, step) in plan {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(written, "sweep interrupted");
            return Ok(written);
        }
        if let Some(approx_ohms) = sink.write_step(cfg.channel, step)? {
            written += 1;
            on_point(SweepPoint {
                phase,
                step,
                approx_ohms,
            });
        }
        let dwell = match phase {
            SweepPhase::Presets => cfg.preset_dwell,
            SweepPhase::Steps => cfg.step_dwell,
        };
        dwell_for(clock, dwell, shutdown);
    }
    tracing::info!(written, "sweep done");
    Ok(written)
}

fn dwell_for<C: Clock>(clock: &C, dwell: Duration, shutdown: &AtomicBool) {
    let mut left = dwell;
    while !left.is_zero() && !shutdown.load(Ordering::Relaxed) {
        let slice = left.min(DWELL_SLICE);
        clock.sleep(slice);
        left -= slice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_presets;

    #[test]
    fn plan_visits_presets_then_every_step() {
        let plan = sweep_plan(&default_presets(), 4, |ohms| u32::try_from(ohms / 1_000).unwrap_or(0));
        assert_eq!(
            plan,
            vec![
                (SweepPhase::Presets, 0),
                (SweepPhase::Presets, 1),
                (SweepPhase::Presets, 5),
                (SweepPhase::Presets, 10),
                (SweepPhase::Steps, 0),
                (SweepPhase::Steps, 1),
                (SweepPhase::Steps, 2),
                (SweepPhase::Steps, 3),
                (SweepPhase::Steps, 4),
            ]
        );
    }
}
