//! Encoder and button edges from Raspberry Pi GPIO interrupts.

use std::sync::Arc;
use std::time::Duration;

use digipot_traits::{EdgeSource, InputEdge, InputLine, Timestamp};
use rppal::gpio::{Event, Gpio, InputPin, Trigger};

use crate::error::{HwError, Result};
use crate::util::{glitch_filter, normalize_level};

/// BCM numbers of the three encoder lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPins {
    pub a: u8,
    pub b: u8,
    pub button: u8,
}

/// Async-interrupt edge source. Interrupt callbacks run on rppal's own
/// threads; the pins must stay alive for as long as edges are wanted.
pub struct GpioEdgeSource {
    pins: EncoderPins,
    active_low: bool,
    glitch_us: Option<u64>,
    inputs: Vec<InputPin>,
}

impl GpioEdgeSource {
    pub fn new(pins: EncoderPins, active_low: bool) -> Self {
        Self {
            pins,
            active_low,
            glitch_us: None,
            inputs: Vec::new(),
        }
    }

    /// Have the driver drop button pulses shorter than `glitch_us`.
    pub fn with_button_glitch_filter(mut self, glitch_us: Option<u64>) -> Self {
        self.glitch_us = glitch_us;
        self
    }

    fn open(&self, gpio: &Gpio, bcm: u8) -> Result<InputPin> {
        let pin = gpio.get(bcm).map_err(|e| HwError::Gpio(format!("pin {bcm}: {e}")))?;
        Ok(if self.active_low {
            pin.into_input_pullup()
        } else {
            pin.into_input_pulldown()
        })
    }

    fn attach(
        &mut self,
        gpio: &Gpio,
        bcm: u8,
        line: InputLine,
        on_edge: Arc<dyn Fn(InputEdge) + Send + Sync>,
    ) -> Result<()> {
        let mut pin = self.open(gpio, bcm)?;
        let active_low = self.active_low;
        let debounce = glitch_filter(line, self.glitch_us);
        pin.set_async_interrupt(Trigger::Both, debounce, move |event: Event| {
            let raw_high = matches!(event.trigger, Trigger::RisingEdge);
            on_edge(InputEdge::new(
                line,
                normalize_level(raw_high, active_low),
                timestamp_of(event.timestamp),
            ));
        })
        .map_err(|e| HwError::Gpio(format!("interrupt on pin {bcm}: {e}")))?;
        tracing::debug!(pin = bcm, ?line, ?debounce, "edge interrupt attached");
        self.inputs.push(pin);
        Ok(())
    }

    /// Detach every interrupt and release the pins.
    pub fn stop(&mut self) {
        for pin in &mut self.inputs {
            if let Err(e) = pin.clear_async_interrupt() {
                tracing::warn!(error = %e, "failed to clear interrupt");
            }
        }
        self.inputs.clear();
    }
}

impl Drop for GpioEdgeSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Kernel edge timestamps are monotonic time since boot.
fn timestamp_of(since_boot: Duration) -> Timestamp {
    Timestamp::from_duration(since_boot)
}

impl EdgeSource for GpioEdgeSource {
    fn start(
        &mut self,
        on_edge: Arc<dyn Fn(InputEdge) + Send + Sync>,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let EncoderPins { a, b, button } = self.pins;
        self.attach(&gpio, a, InputLine::EncoderA, on_edge.clone())?;
        self.attach(&gpio, b, InputLine::EncoderB, on_edge.clone())?;
        self.attach(&gpio, button, InputLine::Button, on_edge)?;
        tracing::info!(a, b, button, active_low = self.active_low, "gpio edge source started");
        Ok(())
    }
}
