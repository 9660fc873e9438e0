//! Human-readable error descriptions and structured JSON error formatting.

use digipot_core::error::{BuildError, DigipotError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun `digipot self-check`."
        );
    }

    if let Some(de) = err.downcast_ref::<DigipotError>() {
        return match de {
            DigipotError::Config(msg) => format!(
                "What happened: Configuration problem: {msg}.\nLikely causes: Missing [pins] section, a typo in a key, or a value out of range.\nHow to fix: Edit the config file (see etc/digipot.toml for a sample), then rerun `digipot self-check`."
            ),
            DigipotError::Bus(msg) | DigipotError::BusFault(msg) => format!(
                "What happened: Writing to the potentiometer failed ({msg}).\nLikely causes: SPI not enabled, wrong chip select in [spi].channels, or loose wiring.\nHow to fix: Enable SPI (raspi-config), check the chip selects and wiring, then restart."
            ),
            DigipotError::Display(msg) => format!(
                "What happened: Display update failed ({msg}).\nLikely causes: Display disconnected.\nHow to fix: Check the display wiring."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("gpio") || lower.contains("interrupt on pin") {
        return "What happened: Failed to set up the encoder pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("opening script") {
        return format!("What happened: {msg}.\nHow to fix: Check the --script path.");
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 for configuration problems, 3 for bus failures, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<DigipotError>() {
        Some(DigipotError::Config(_)) => 2,
        Some(DigipotError::Bus(_) | DigipotError::BusFault(_)) => 3,
        _ => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<DigipotError>() {
        Some(DigipotError::Config(_)) => "Config",
        Some(DigipotError::Bus(_)) => "Bus",
        Some(DigipotError::BusFault(_)) => "BusFault",
        Some(DigipotError::Display(_)) => "Display",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "error": err.to_string(),
        "message": humanize(err),
    })
    .to_string()
}
