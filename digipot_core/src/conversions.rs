//! `From` implementations bridging `digipot_config` types to runtime types,
//! plus constructors that assemble a controller and sink from a full config.

use digipot_traits::PotBus;

use crate::config::{AccelCfg, DebounceCfg, Preset, RangeCfg, SinkCfg, UiCfg};
use crate::controller::PotController;
use crate::error::Result;
use crate::sink::PotSink;
use crate::units::UnitConverter;
use crate::util::millis_to_micros;

// ── RangeCfg ─────────────────────────────────────────────────────────────────

impl From<&digipot_config::Range> for RangeCfg {
    fn from(c: &digipot_config::Range) -> Self {
        Self {
            min_ohms: c.min_ohms,
            max_ohms: c.max_ohms,
            max_steps: c.max_steps,
            default_ohms: c.default_ohms,
        }
    }
}

// ── DebounceCfg ──────────────────────────────────────────────────────────────

impl From<&digipot_config::Debounce> for DebounceCfg {
    fn from(c: &digipot_config::Debounce) -> Self {
        Self {
            menu_us: c.menu_us,
            adjust_us: c.adjust_us,
            button_us: c.button_us,
        }
    }
}

// ── AccelCfg ─────────────────────────────────────────────────────────────────

impl From<&digipot_config::Accel> for AccelCfg {
    fn from(c: &digipot_config::Accel) -> Self {
        Self {
            speed_threshold: c.speed_threshold,
            fine_ohms: c.fine_ohms,
            coarse_ohms: c.coarse_ohms,
            speed_limit: c.speed_limit,
        }
    }
}

// ── Preset ───────────────────────────────────────────────────────────────────

impl From<&digipot_config::Preset> for Preset {
    fn from(c: &digipot_config::Preset) -> Self {
        Self::new(c.ohms, c.label.clone())
    }
}

// ── UiCfg / SinkCfg need more than one section ───────────────────────────────

impl From<&digipot_config::Config> for UiCfg {
    fn from(c: &digipot_config::Config) -> Self {
        Self {
            long_press_us: millis_to_micros(c.ui.long_press_ms),
            mode_select: c.ui.mode_select,
            channels: c.spi.channels.len(),
            width: c.ui.width,
            default_preset: c.ui.default_preset,
        }
    }
}

impl From<&digipot_config::Config> for SinkCfg {
    fn from(c: &digipot_config::Config) -> Self {
        Self {
            command: c.spi.command,
            channels: c.spi.channels.len(),
        }
    }
}

/// Build a controller from a validated config.
pub fn controller_from_config(c: &digipot_config::Config) -> Result<PotController> {
    PotController::builder()
        .with_range(RangeCfg::from(&c.range))
        .with_debounce(DebounceCfg::from(&c.debounce))
        .with_accel(AccelCfg::from(&c.accel))
        .with_ui(UiCfg::from(c))
        .with_presets(c.presets.iter().map(Preset::from).collect())
        .try_build()
}

/// Wrap `bus` in a sink configured from `c`.
pub fn sink_from_config<B: PotBus>(bus: B, c: &digipot_config::Config) -> PotSink<B> {
    let range = RangeCfg::from(&c.range);
    PotSink::new(bus, UnitConverter::from(&range), SinkCfg::from(c))
}
