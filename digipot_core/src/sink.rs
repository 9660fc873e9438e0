//! Hardware sink: validates a step and writes it to one wiper.

use digipot_traits::PotBus;
use eyre::WrapErr;

use crate::config::SinkCfg;
use crate::error::{Report, Result};
use crate::hw_error::map_hw_error;
use crate::units::UnitConverter;

pub struct PotSink<B: PotBus> {
    bus: B,
    converter: UnitConverter,
    cfg: SinkCfg,
}

impl<B: PotBus> core::fmt::Debug for PotSink<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PotSink")
            .field("converter", &self.converter)
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl<B: PotBus> PotSink<B> {
    pub fn new(bus: B, converter: UnitConverter, cfg: SinkCfg) -> Self {
        Self {
            bus,
            converter,
            cfg,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Write `step` to `channel`.
    ///
    /// An out-of-range step or unknown channel is reported and skipped:
    /// `Ok(None)`, nothing reaches the bus. On success returns the approximate
    /// resistance now set. Bus failures are returned as errors and end the
    /// session.
    pub fn write_step(&mut self, channel: usize, step: u32) -> Result<Option<f64>> {
        if channel >= self.cfg.channels {
            tracing::warn!(channel, channels = self.cfg.channels, "unknown channel, write skipped");
            return Ok(None);
        }
        let Some(byte) = u8::try_from(step)
            .ok()
            .filter(|_| step <= self.converter.max_steps())
        else {
            tracing::warn!(
                channel,
                step,
                max_steps = self.converter.max_steps(),
                "step out of range, write skipped"
            );
            return Ok(None);
        };

        self.bus
            .write(channel, [self.cfg.command, byte])
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))
            .wrap_err_with(|| format!("writing step {step} to channel {channel}"))?;

        let approx = self.converter.step_to_ohms(step);
        tracing::info!(channel, step, ohms = approx, "wiper set");
        Ok(Some(approx))
    }
}
