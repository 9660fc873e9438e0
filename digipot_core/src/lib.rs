#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core potentiometer control logic (hardware-agnostic).
//!
//! Raw encoder and button edges go in, wiper writes and display lines come
//! out. All hardware interaction goes through `digipot_traits::PotBus` and
//! `digipot_traits::LineDisplay`.
//!
//! ## Architecture
//!
//! - **Decoding**: Gray-code quadrature decoder emitting one detent per click (`quadrature`)
//! - **Filtering**: per-stream minimum-interval gates (`debounce`)
//! - **Acceleration**: detent speed to a fine or coarse ohm step (`accel`)
//! - **Pages**: menu state machine with long-press reset (`controller`, `page`)
//! - **Output**: ohm/step mapping (`units`) and the validated bus write (`sink`)
//! - **Loop**: channel-fed dispatch with a periodic display flush (`runner`)
//! - **Bring-up**: preset and full-range wiper sweep (`sweep`)
//!
//! ## Units
//!
//! Resistance targets are whole ohms in `i32`; wiper positions are `u32`
//! steps in `0..=max_steps`. Timestamps are microseconds.

pub mod accel;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod debounce;
pub mod display;
pub mod error;
pub mod event;
pub mod hw_error;
pub mod mocks;
pub mod page;
pub mod quadrature;
pub mod runner;
pub mod sink;
pub mod sweep;
pub mod units;
pub mod util;

pub use accel::{Acceleration, MAX_SPEED, speed_from_interval};
pub use config::{AccelCfg, DebounceCfg, Preset, RangeCfg, SinkCfg, UiCfg, default_presets};
pub use controller::{Confirmation, PotController, PotControllerBuilder};
pub use conversions::{controller_from_config, sink_from_config};
pub use debounce::{Accepted, DebounceGate};
pub use display::DirtyLines;
pub use error::{BuildError, DigipotError, Report, Result};
pub use event::{Event, Intent};
pub use page::{Page, Subscriptions, VarConst};
pub use quadrature::{Detent, Direction, EncoderPin, QuadratureDecoder};
pub use runner::{RunStats, Runner};
pub use sink::PotSink;
pub use sweep::{SweepCfg, SweepPhase, SweepPoint, run_sweep, sweep_plan};
pub use units::UnitConverter;
