//! Hardware adapters for the potentiometer controller.
//!
//! The simulated bus, display and scripted encoder are always available.
//! Real GPIO edge interrupts and SPI writes need the `hardware` feature
//! (Raspberry Pi, via `rppal`).

pub mod error;
pub mod sim;
pub mod util;

#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod spi;

pub use sim::{ConsoleDisplay, ScriptTiming, ScriptedEncoder, SimCommand, SimulatedBus};

#[cfg(feature = "hardware")]
pub use gpio::{EncoderPins, GpioEdgeSource};
#[cfg(feature = "hardware")]
pub use spi::SpiPotBus;
