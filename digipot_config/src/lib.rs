#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the potentiometer controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Everything except `[pins]` has defaults matching a 10 kOhm, 7-bit
//!   MCP41xx-style part on a KY-040 encoder.
use serde::Deserialize;
use serde::de::Deserializer;

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub encoder_a: u8,
    pub encoder_b: u8,
    pub button: u8,
    /// Pull-up wiring: idle lines read high. Levels are inverted on input so
    /// the encoder rests at state 0 and a pressed button reads high.
    #[serde(default = "default_true")]
    pub active_low: bool,
    /// Button pulses shorter than this (us) are dropped by the GPIO driver
    /// before they reach the controller. Encoder lines are never filtered.
    #[serde(default)]
    pub glitch_us: Option<u64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Spi {
    /// SPI bus index (0 = /dev/spidev0.*)
    pub bus: u8,
    /// Chip-select per potentiometer channel; one or two entries.
    pub channels: Vec<u8>,
    pub clock_hz: u32,
    /// Command/address byte sent before the step value.
    pub command: u8,
}

impl Default for Spi {
    fn default() -> Self {
        Self {
            bus: 0,
            channels: vec![0, 1],
            clock_hz: 50_000,
            command: 0x00,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Range {
    pub min_ohms: i32,
    pub max_ohms: i32,
    /// Highest wiper position; the part accepts 0..=max_steps.
    pub max_steps: u32,
    pub default_ohms: i32,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min_ohms: 100,
            max_ohms: 10_000,
            max_steps: 128,
            default_ohms: 5_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Debounce {
    /// Minimum detent interval on selection pages (us).
    pub menu_us: u64,
    /// Minimum detent interval while adjusting resistance (us).
    pub adjust_us: u64,
    /// Minimum interval between accepted button presses (us).
    pub button_us: u64,
}

impl Default for Debounce {
    fn default() -> Self {
        Self {
            menu_us: 15_000,
            adjust_us: 10_000,
            button_us: 200_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Accel {
    /// Detents per second at which the coarse step kicks in.
    pub speed_threshold: u32,
    pub fine_ohms: i32,
    pub coarse_ohms: i32,
    /// Detents faster than this are ignored (1000 = speed cap, never ignored).
    pub speed_limit: u32,
}

impl Default for Accel {
    fn default() -> Self {
        Self {
            speed_threshold: 10,
            fine_ohms: 10,
            coarse_ohms: 100,
            speed_limit: 1_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ui {
    /// Hold duration that turns a release into "reset and go back".
    pub long_press_ms: u64,
    /// Show the Variable/Constant choice after picking a pot.
    pub mode_select: bool,
    /// Display flush period.
    pub tick_ms: u64,
    /// Characters per display line.
    pub width: usize,
    /// Preset index selected when entering or resetting ConstantSelect.
    pub default_preset: usize,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            long_press_ms: 3_000,
            mode_select: true,
            tick_ms: 50,
            width: 20,
            default_preset: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Preset {
    pub ohms: i32,
    pub label: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub spi: Spi,
    #[serde(default)]
    pub range: Range,
    #[serde(default)]
    pub debounce: Debounce,
    #[serde(default)]
    pub accel: Accel,
    #[serde(default)]
    pub ui: Ui,
    /// Preset list for the constant page. Accepts either
    /// `[[presets]] ohms = 100, label = "100"` tables or bare integers.
    #[serde(default = "default_presets", deserialize_with = "de_presets")]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn default_presets() -> Vec<Preset> {
    [(100, "100"), (1_000, "1k"), (5_000, "5k"), (10_000, "10k")]
        .into_iter()
        .map(|(ohms, label)| Preset {
            ohms,
            label: label.to_string(),
        })
        .collect()
}

/// Short label for an ohm value: 470 -> "470", 4700 -> "4.7k", 10000 -> "10k".
pub fn ohms_label(ohms: i32) -> String {
    if ohms.abs() >= 1_000 {
        let whole = ohms / 1_000;
        let tenths = (ohms % 1_000).abs() / 100;
        if tenths == 0 {
            format!("{whole}k")
        } else {
            format!("{whole}.{tenths}k")
        }
    } else {
        ohms.to_string()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PresetToml {
    Ohms(i32),
    Table { ohms: i32, label: Option<String> },
}

fn de_presets<'de, D>(deserializer: D) -> Result<Vec<Preset>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<PresetToml> = Vec::deserialize(deserializer)?;
    Ok(items
        .into_iter()
        .map(|p| match p {
            PresetToml::Ohms(ohms) => Preset {
                ohms,
                label: ohms_label(ohms),
            },
            PresetToml::Table { ohms, label } => Preset {
                ohms,
                label: label.unwrap_or_else(|| ohms_label(ohms)),
            },
        })
        .collect())
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let p = &self.pins;
        if p.encoder_a == p.encoder_b || p.encoder_a == p.button || p.encoder_b == p.button {
            eyre::bail!("pins.encoder_a, pins.encoder_b and pins.button must be distinct");
        }
        if let Some(g) = p.glitch_us
            && !(1..=1_000_000).contains(&g)
        {
            eyre::bail!("pins.glitch_us must be in [1, 1000000]");
        }

        // SPI
        if self.spi.channels.is_empty() || self.spi.channels.len() > 2 {
            eyre::bail!("spi.channels must list one or two chip selects");
        }
        if self.spi.clock_hz == 0 {
            eyre::bail!("spi.clock_hz must be > 0");
        }

        // Range
        let r = &self.range;
        if r.max_ohms <= 0 {
            eyre::bail!("range.max_ohms must be > 0");
        }
        if r.min_ohms < 0 || r.min_ohms > r.max_ohms {
            eyre::bail!("range.min_ohms must be in [0, range.max_ohms]");
        }
        if r.max_steps == 0 || r.max_steps > u32::from(u8::MAX) {
            eyre::bail!("range.max_steps must be in [1, 255]");
        }
        if !(r.min_ohms..=r.max_ohms).contains(&r.default_ohms) {
            eyre::bail!("range.default_ohms must be in [range.min_ohms, range.max_ohms]");
        }

        // Debounce
        if self.debounce.menu_us > 1_000_000
            || self.debounce.adjust_us > 1_000_000
            || self.debounce.button_us > 5_000_000
        {
            eyre::bail!("debounce intervals are unreasonably large");
        }

        // Acceleration
        if self.accel.speed_threshold == 0 {
            eyre::bail!("accel.speed_threshold must be >= 1");
        }
        if self.accel.fine_ohms <= 0 || self.accel.coarse_ohms <= 0 {
            eyre::bail!("accel.fine_ohms and accel.coarse_ohms must be > 0");
        }
        if self.accel.speed_limit == 0 {
            eyre::bail!("accel.speed_limit must be >= 1");
        }

        // UI
        if self.ui.long_press_ms == 0 {
            eyre::bail!("ui.long_press_ms must be >= 1");
        }
        if self.ui.tick_ms == 0 || self.ui.tick_ms > 1_000 {
            eyre::bail!("ui.tick_ms must be in [1, 1000]");
        }
        if self.ui.width < 16 {
            eyre::bail!("ui.width must be >= 16");
        }

        // Presets
        if self.ui.mode_select {
            if self.presets.is_empty() {
                eyre::bail!("presets must not be empty when ui.mode_select is enabled");
            }
            if self.ui.default_preset >= self.presets.len() {
                eyre::bail!("ui.default_preset must index into presets");
            }
        }
        for preset in &self.presets {
            if !(0..=r.max_ohms).contains(&preset.ohms) {
                eyre::bail!(
                    "preset {} ({} ohms) must be in [0, range.max_ohms]",
                    preset.label,
                    preset.ohms
                );
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_use_k_suffix() {
        assert_eq!(ohms_label(100), "100");
        assert_eq!(ohms_label(1_000), "1k");
        assert_eq!(ohms_label(4_700), "4.7k");
        assert_eq!(ohms_label(10_000), "10k");
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = load_toml("[pins]\nencoder_a = 22\nencoder_b = 27\nbutton = 17\n").unwrap();
        assert!(cfg.pins.active_low);
        assert_eq!(cfg.range.max_steps, 128);
        assert_eq!(cfg.presets, default_presets());
        cfg.validate().unwrap();
    }
}
