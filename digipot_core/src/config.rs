//! Configuration types for the controller.
//!
//! These are the runtime configuration structs used by `PotController` and
//! `PotSink`. They are separate from the TOML-deserialized config in
//! `digipot_config`; see `conversions` for the mapping.

/// Resistance range and wiper resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCfg {
    /// Lowest target the adjust page will accept.
    pub min_ohms: i32,
    /// Full-scale resistance; `max_steps` maps to this.
    pub max_ohms: i32,
    /// Highest wiper position accepted by the part.
    pub max_steps: u32,
    /// Target restored on entering the adjust page and after a long press.
    pub default_ohms: i32,
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self {
            min_ohms: 100,
            max_ohms: 10_000,
            max_steps: 128,
            default_ohms: 5_000,
        }
    }
}

/// Minimum accepted interval per input stream, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceCfg {
    pub menu_us: u64,
    pub adjust_us: u64,
    pub button_us: u64,
}

impl Default for DebounceCfg {
    fn default() -> Self {
        Self {
            menu_us: 15_000,
            adjust_us: 10_000,
            button_us: 200_000,
        }
    }
}

/// Two-tier acceleration: detents slower than `speed_threshold` move the
/// target by `fine_ohms`, faster ones by `coarse_ohms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelCfg {
    /// Detents per second.
    pub speed_threshold: u32,
    pub fine_ohms: i32,
    pub coarse_ohms: i32,
    /// Detents above this speed are dropped.
    pub speed_limit: u32,
}

impl Default for AccelCfg {
    fn default() -> Self {
        Self {
            speed_threshold: 10,
            fine_ohms: 10,
            coarse_ohms: 100,
            speed_limit: 1_000,
        }
    }
}

/// Page flow and display layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiCfg {
    /// Hold time (us) at or above which a release resets and leaves the page.
    pub long_press_us: u64,
    /// Insert the Variable/Constant choice after a pot is picked.
    pub mode_select: bool,
    /// Number of independently addressable wipers (1 or 2).
    pub channels: usize,
    /// Characters per display line.
    pub width: usize,
    /// Index into the preset list used on entry and after a long press.
    pub default_preset: usize,
}

impl Default for UiCfg {
    fn default() -> Self {
        Self {
            long_press_us: 3_000_000,
            mode_select: true,
            channels: 2,
            width: 20,
            default_preset: 2,
        }
    }
}

/// A fixed resistance offered on the constant page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub ohms: i32,
    pub label: String,
}

impl Preset {
    pub fn new(ohms: i32, label: impl Into<String>) -> Self {
        Self {
            ohms,
            label: label.into(),
        }
    }
}

/// The stock 100 / 1k / 5k / 10k preset list.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new(100, "100"),
        Preset::new(1_000, "1k"),
        Preset::new(5_000, "5k"),
        Preset::new(10_000, "10k"),
    ]
}

/// Bus framing for the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkCfg {
    /// Byte 0 of every write.
    pub command: u8,
    pub channels: usize,
}

impl Default for SinkCfg {
    fn default() -> Self {
        Self {
            command: 0x00,
            channels: 2,
        }
    }
}
