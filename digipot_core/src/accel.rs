//! Speed estimate and the two-tier acceleration lookup.

use crate::config::AccelCfg;
use crate::util::MICROS_PER_SEC;

/// Detents per second reported for very fast (or first) detents.
pub const MAX_SPEED: u32 = 1_000;

/// `min(1_000_000 / interval, 1000)`. A missing or zero interval saturates.
pub fn speed_from_interval(interval_us: Option<u64>) -> u32 {
    match interval_us {
        Some(dt) if dt > 0 => {
            let per_sec = MICROS_PER_SEC / dt;
            u32::try_from(per_sec.min(u64::from(MAX_SPEED))).unwrap_or(MAX_SPEED)
        }
        _ => MAX_SPEED,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acceleration {
    cfg: AccelCfg,
}

impl Acceleration {
    pub fn new(cfg: AccelCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &AccelCfg {
        &self.cfg
    }

    /// Ohms per detent at `speed`, or `None` when the detent is too fast to
    /// trust.
    pub fn change_for(&self, speed: u32) -> Option<i32> {
        if speed > self.cfg.speed_limit {
            return None;
        }
        Some(self.tier(speed))
    }

    /// Like `change_for`, from the interval to the previous accepted detent.
    /// The limit is checked against the unrounded speed. The first detent
    /// after a reset has no interval: it counts as full speed but is never
    /// dropped by the limit.
    pub fn change_for_interval(&self, interval_us: Option<u64>) -> Option<i32> {
        if let Some(dt) = interval_us
            && self.exceeds_limit(dt)
        {
            return None;
        }
        Some(self.tier(speed_from_interval(interval_us)))
    }

    /// `min(1e6 / dt, MAX_SPEED) > speed_limit`, without integer rounding.
    fn exceeds_limit(&self, dt: u64) -> bool {
        let limit = u64::from(self.cfg.speed_limit);
        limit < u64::from(MAX_SPEED) && MICROS_PER_SEC > limit.saturating_mul(dt)
    }

    fn tier(&self, speed: u32) -> i32 {
        if speed < self.cfg.speed_threshold {
            self.cfg.fine_ohms
        } else {
            self.cfg.coarse_ohms
        }
    }
}

impl Default for Acceleration {
    fn default() -> Self {
        Self::new(AccelCfg::default())
    }
}
