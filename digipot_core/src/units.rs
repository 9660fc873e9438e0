//! Linear mapping between resistance and wiper steps.
//!
//! The mapping truncates: `step = floor(ohms / max_ohms * max_steps)`. Going
//! step -> ohms -> step is exact; ohms -> step -> ohms lands up to one
//! quantization unit (`max_ohms / max_steps`) below the input.

use crate::config::RangeCfg;

/// Float error allowed when a scaled value sits on an exact step boundary.
const STEP_SNAP: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConverter {
    max_ohms: i32,
    max_steps: u32,
}

impl UnitConverter {
    /// `max_ohms` must be positive; a non-positive value is treated as 1.
    pub fn new(max_ohms: i32, max_steps: u32) -> Self {
        Self {
            max_ohms: max_ohms.max(1),
            max_steps,
        }
    }

    pub fn max_ohms(&self) -> i32 {
        self.max_ohms
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Resistance covered by one step.
    pub fn quantum_ohms(&self) -> f64 {
        f64::from(self.max_ohms) / f64::from(self.max_steps.max(1))
    }

    /// Clamp `ohms` to `[0, max_ohms]` and scale down to a wiper step.
    pub fn ohms_to_step(&self, ohms: f64) -> u32 {
        let max = f64::from(self.max_ohms);
        let clamped = if ohms.is_nan() { 0.0 } else { ohms.clamp(0.0, max) };
        // Multiply before dividing so exact step multiples stay exact.
        let scaled = clamped * f64::from(self.max_steps) / max;
        let nearest = scaled.round();
        let step = if (scaled - nearest).abs() < STEP_SNAP {
            nearest
        } else {
            scaled.floor()
        };
        step as u32
    }

    /// Approximate resistance for a wiper step. Not clamped.
    pub fn step_to_ohms(&self, step: u32) -> f64 {
        f64::from(step) * f64::from(self.max_ohms) / f64::from(self.max_steps.max(1))
    }

    /// Step for an integer resistance target.
    #[inline]
    pub fn target_step(&self, ohms: i32) -> u32 {
        self.ohms_to_step(f64::from(ohms))
    }
}

impl From<&RangeCfg> for UnitConverter {
    fn from(r: &RangeCfg) -> Self {
        Self::new(r.max_ohms, r.max_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> UnitConverter {
        UnitConverter::new(10_000, 128)
    }

    #[test]
    fn known_points() {
        let c = stock();
        assert_eq!(c.target_step(0), 0);
        assert_eq!(c.target_step(100), 1);
        assert_eq!(c.target_step(1_000), 12);
        assert_eq!(c.target_step(5_000), 64);
        assert_eq!(c.target_step(10_000), 128);
        assert_eq!(c.step_to_ohms(64), 5_000.0);
        assert_eq!(c.step_to_ohms(1), 78.125);
    }

    #[test]
    fn clamps_out_of_range() {
        let c = stock();
        assert_eq!(c.target_step(-500), 0);
        assert_eq!(c.target_step(25_000), 128);
        assert_eq!(c.ohms_to_step(f64::NAN), 0);
    }

    #[test]
    fn truncation_is_lossy() {
        let c = stock();
        // 5100 ohms sits between steps 65 (5078.1) and 66 (5156.25)
        let step = c.target_step(5_100);
        assert_eq!(step, 65);
        assert!((c.step_to_ohms(step) - 5_078.125).abs() < 1e-9);
    }

    #[test]
    fn non_power_of_two_resolution_round_trips() {
        let c = UnitConverter::new(50_000, 255);
        for step in 0..=255 {
            assert_eq!(c.ohms_to_step(c.step_to_ohms(step)), step, "step {step}");
        }
    }
}
