#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Arbitrary TOML must parse, validate and build a controller without panicking.
    let Ok(cfg) = toml::from_str::<digipot_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        let _ = digipot_core::controller_from_config(&cfg);
    }
});
