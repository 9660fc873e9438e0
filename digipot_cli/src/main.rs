#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! digipot command-line entry point.

mod cli;
mod error_fmt;
#[cfg(not(feature = "hardware"))]
mod sim;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use digipot_config::Config;
use digipot_core::{
    DigipotError, RunStats, Runner, SweepCfg, SweepPhase, UnitConverter, controller_from_config,
    run_sweep, sink_from_config,
};
use eyre::WrapErr;
use serde_json::json;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let _ = JSON_MODE.set(json);

    if let Err(e) = real_main(cli) {
        if json {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
            tracing::debug!(error = ?e, "command failed");
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if !cli.json {
        // Only decorates reports when RUST_BACKTRACE/RUST_SPANTRACE ask for it.
        let _ = color_eyre::install();
    }

    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run { script, stats } => run(&cfg, script.as_deref(), stats, cli.json),
        Commands::Convert { ohms, step } => convert(&cfg, ohms, step, cli.json),
        Commands::Sweep {
            channel,
            dwell_ms,
            preset_dwell_ms,
        } => {
            let sweep_cfg = sweep_cfg(&cfg, channel, dwell_ms, preset_dwell_ms)?;
            sweep(&cfg, &sweep_cfg, cli.json)
        }
        Commands::SelfCheck => self_check(&cfg, cli.json),
    }
}

/// Read, parse and validate the config. Every failure is a `DigipotError::Config`.
fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| DigipotError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: Result<Config, toml::de::Error> = digipot_config::load_toml(&text);
    let cfg = parsed
        .map_err(|e| DigipotError::Config(format!("{}: {}", path.display(), e.message())))?;
    cfg.validate()
        .map_err(|e| DigipotError::Config(e.to_string()))?;
    Ok(cfg)
}

/// RUST_LOG wins, then `--log-level`, then `[logging].level`, then "info".
fn init_tracing(json: bool, cli_level: Option<&str>, cfg: &Config) -> eyre::Result<()> {
    let level = cli_level
        .or(cfg.logging.level.as_deref())
        .unwrap_or("info")
        .to_string();
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.clone()))
    };

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(filter())
            .boxed()
    };

    let file = match cfg.logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| DigipotError::Config(format!("logging.file '{}' has no file name", path.display())))?;
            let appender = match cfg.logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter())
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("installing log subscriber")?;
    Ok(())
}

fn install_ctrlc(shutdown: &Arc<AtomicBool>) -> eyre::Result<()> {
    let flag = Arc::clone(shutdown);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("installing Ctrl-C handler")
}

#[cfg(not(feature = "hardware"))]
fn run(cfg: &Config, script: Option<&Path>, show_stats: bool, json: bool) -> eyre::Result<()> {
    use digipot_hardware::{ConsoleDisplay, SimulatedBus};
    use digipot_traits::MonotonicClock;
    use std::io::BufRead;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc(&shutdown)?;

    let input: Box<dyn BufRead + Send> = match script {
        Some(path) => Box::new(std::io::BufReader::new(
            std::fs::File::open(path).wrap_err_with(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    let feeder = {
        let shutdown = Arc::clone(&shutdown);
        std::thread::Builder::new()
            .name("sim-input".into())
            .spawn(move || sim::feed(input, &MonotonicClock::new(), &tx, &shutdown))
            .wrap_err("spawning simulator input thread")?
    };

    let bus = SimulatedBus::new(cfg.spi.channels.len(), cfg.range.max_ohms, cfg.range.max_steps);
    let display = if json {
        ConsoleDisplay::new(digipot_core::display::LINE_COUNT).quiet()
    } else {
        ConsoleDisplay::new(digipot_core::display::LINE_COUNT)
    };
    let bus = if json { bus.quiet() } else { bus };

    let mut runner = Runner::new(
        controller_from_config(cfg)?,
        sink_from_config(bus, cfg),
        display,
        Duration::from_millis(cfg.ui.tick_ms),
    );
    let stats = runner.run(&rx, &shutdown)?;

    // A Ctrl-C may leave the feeder blocked on stdin; the process exit reaps it.
    if !shutdown.load(Ordering::Relaxed) {
        match feeder.join() {
            Ok(Ok(n)) => tracing::debug!(commands = n, "simulator input finished"),
            Ok(Err(e)) => return Err(e),
            Err(_) => eyre::bail!("simulator input thread panicked"),
        }
    }

    report(&runner, stats, show_stats, json);
    Ok(())
}

#[cfg(feature = "hardware")]
fn run(cfg: &Config, script: Option<&Path>, show_stats: bool, json: bool) -> eyre::Result<()> {
    use digipot_hardware::{ConsoleDisplay, EncoderPins, GpioEdgeSource, SpiPotBus};
    use digipot_traits::{EdgeSource, InputEdge};

    if script.is_some() {
        tracing::warn!("--script is ignored in hardware builds");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc(&shutdown)?;

    let bus = SpiPotBus::open(cfg.spi.bus, &cfg.spi.channels, cfg.spi.clock_hz)?;
    let mut runner = Runner::new(
        controller_from_config(cfg)?,
        sink_from_config(bus, cfg),
        ConsoleDisplay::new(digipot_core::display::LINE_COUNT),
        Duration::from_millis(cfg.ui.tick_ms),
    );

    let (tx, rx) = crossbeam_channel::unbounded::<InputEdge>();
    let mut source = GpioEdgeSource::new(
        EncoderPins {
            a: cfg.pins.encoder_a,
            b: cfg.pins.encoder_b,
            button: cfg.pins.button,
        },
        cfg.pins.active_low,
    )
    .with_button_glitch_filter(cfg.pins.glitch_us);
    source
        .start(Arc::new(move |edge| {
            let _ = tx.send(edge);
        }))
        .map_err(|e| eyre::eyre!("starting GPIO edge source: {e}"))?;

    let result = runner.run(&rx, &shutdown);
    source.stop();
    let stats = result?;

    report(&runner, stats, show_stats, json);
    Ok(())
}

fn report<B, D>(runner: &Runner<B, D>, stats: RunStats, show_stats: bool, json: bool)
where
    B: digipot_traits::PotBus,
    D: digipot_traits::LineDisplay,
{
    let ctl = runner.controller();
    if json {
        let obj = json!({
            "page": ctl.page().to_string(),
            "channel": ctl.selected_channel() + 1,
            "target_ohms": ctl.target_ohms(),
            "target_step": ctl.target_step(),
            "confirmed_ohms": ctl.confirmation().map(|c| c.approx_ohms),
            "edges": stats.edges,
            "writes": stats.writes,
            "skipped_writes": stats.skipped_writes,
            "display_updates": stats.display_updates,
            "display_errors": stats.display_errors,
        });
        println!("{obj}");
    } else if show_stats {
        println!(
            "page: {}, pot {}, target {} Ohms (step {})",
            ctl.page(),
            ctl.selected_channel() + 1,
            ctl.target_ohms(),
            ctl.target_step()
        );
        println!(
            "edges: {}, ticks: {}, writes: {}, skipped: {}, display updates: {}, display errors: {}",
            stats.edges,
            stats.ticks,
            stats.writes,
            stats.skipped_writes,
            stats.display_updates,
            stats.display_errors
        );
    }
}

/// Check the 1-based `--channel` against the configured chip selects.
fn sweep_cfg(cfg: &Config, channel: usize, dwell_ms: u64, preset_dwell_ms: u64) -> eyre::Result<SweepCfg> {
    let channels = cfg.spi.channels.len();
    if !(1..=channels).contains(&channel) {
        return Err(DigipotError::Config(format!(
            "--channel {channel} is outside 1..={channels} (spi.channels)"
        ))
        .into());
    }
    Ok(SweepCfg {
        channel: channel - 1,
        preset_dwell: Duration::from_millis(preset_dwell_ms),
        step_dwell: Duration::from_millis(dwell_ms),
    })
}

#[cfg(not(feature = "hardware"))]
fn sweep(cfg: &Config, sweep_cfg: &SweepCfg, json: bool) -> eyre::Result<()> {
    use digipot_hardware::SimulatedBus;

    // The sweep prints its own line per point.
    let bus = SimulatedBus::new(cfg.spi.channels.len(), cfg.range.max_ohms, cfg.range.max_steps).quiet();
    sweep_on(bus, cfg, sweep_cfg, json)
}

#[cfg(feature = "hardware")]
fn sweep(cfg: &Config, sweep_cfg: &SweepCfg, json: bool) -> eyre::Result<()> {
    use digipot_hardware::SpiPotBus;

    let bus = SpiPotBus::open(cfg.spi.bus, &cfg.spi.channels, cfg.spi.clock_hz)?;
    sweep_on(bus, cfg, sweep_cfg, json)
}

fn sweep_on<B: digipot_traits::PotBus>(
    bus: B,
    cfg: &Config,
    sweep_cfg: &SweepCfg,
    json: bool,
) -> eyre::Result<()> {
    use digipot_traits::MonotonicClock;

    let shutdown = Arc::new(AtomicBool::new(false));
    install_ctrlc(&shutdown)?;

    let presets = controller_from_config(cfg)?.presets().to_vec();
    let mut sink = sink_from_config(bus, cfg);
    let mut phase: Option<SweepPhase> = None;
    let written = run_sweep(
        &mut sink,
        &presets,
        sweep_cfg,
        &MonotonicClock::new(),
        &shutdown,
        |p| {
            if json {
                println!(
                    "{}",
                    json!({
                        "phase": p.phase.name(),
                        "channel": sweep_cfg.channel + 1,
                        "step": p.step,
                        "approx_ohms": p.approx_ohms,
                    })
                );
                return;
            }
            if phase != Some(p.phase) {
                phase = Some(p.phase);
                match p.phase {
                    SweepPhase::Presets => println!("Pot {}: presets", sweep_cfg.channel + 1),
                    SweepPhase::Steps => println!(
                        "Pot {}: steps 0..={}",
                        sweep_cfg.channel + 1,
                        cfg.range.max_steps
                    ),
                }
            }
            println!("Step: {:3} | Approx: {:7.1} Ohms", p.step, p.approx_ohms);
        },
    )?;
    tracing::debug!(written, "sweep finished");
    Ok(())
}

fn convert(cfg: &Config, ohms: Option<f64>, step: Option<u32>, json: bool) -> eyre::Result<()> {
    let conv = UnitConverter::new(cfg.range.max_ohms, cfg.range.max_steps);
    let (step, approx) = match (ohms, step) {
        (Some(o), _) => {
            let s = conv.ohms_to_step(o);
            (s, conv.step_to_ohms(s))
        }
        (None, Some(s)) => {
            if s > conv.max_steps() {
                return Err(DigipotError::Config(format!(
                    "step {s} is above range.max_steps ({})",
                    conv.max_steps()
                ))
                .into());
            }
            (s, conv.step_to_ohms(s))
        }
        (None, None) => eyre::bail!("pass --ohms or --step"),
    };

    if json {
        println!(
            "{}",
            json!({
                "requested_ohms": ohms,
                "step": step,
                "approx_ohms": approx,
                "quantum_ohms": conv.quantum_ohms(),
            })
        );
    } else {
        if let Some(o) = ohms {
            println!("{o} Ohms -> step {step}");
        }
        println!("Step: {step} | Approx: {approx:.1} Ohms");
    }
    Ok(())
}

fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    // Building the controller runs the same checks the dispatch loop relies on.
    let ctl = controller_from_config(cfg)?;
    let conv = ctl.converter();
    if json {
        println!(
            "{}",
            json!({
                "ok": true,
                "channels": cfg.spi.channels.len(),
                "range": {
                    "min_ohms": cfg.range.min_ohms,
                    "max_ohms": cfg.range.max_ohms,
                    "max_steps": cfg.range.max_steps,
                    "default_ohms": cfg.range.default_ohms,
                    "quantum_ohms": conv.quantum_ohms(),
                },
                "accel": {
                    "speed_threshold": cfg.accel.speed_threshold,
                    "fine_ohms": cfg.accel.fine_ohms,
                    "coarse_ohms": cfg.accel.coarse_ohms,
                    "speed_limit": cfg.accel.speed_limit,
                },
                "long_press_ms": cfg.ui.long_press_ms,
                "mode_select": cfg.ui.mode_select,
                "presets": ctl.presets().iter().map(|p| json!({"label": p.label, "ohms": p.ohms})).collect::<Vec<_>>(),
            })
        );
        return Ok(());
    }

    println!("config ok");
    println!(
        "pins: A={} B={} button={} active_low={}",
        cfg.pins.encoder_a, cfg.pins.encoder_b, cfg.pins.button, cfg.pins.active_low
    );
    println!(
        "spi: bus {} chip selects {:?} at {} Hz, command 0x{:02x}",
        cfg.spi.bus, cfg.spi.channels, cfg.spi.clock_hz, cfg.spi.command
    );
    println!(
        "range: {}..={} Ohms over {} steps ({:.2} Ohms/step), default {}",
        cfg.range.min_ohms,
        cfg.range.max_ohms,
        cfg.range.max_steps,
        conv.quantum_ohms(),
        cfg.range.default_ohms
    );
    println!(
        "accel: fine {} / coarse {} Ohms at {} detents/s, limit {}",
        cfg.accel.fine_ohms, cfg.accel.coarse_ohms, cfg.accel.speed_threshold, cfg.accel.speed_limit
    );
    println!(
        "ui: long press {} ms, mode select {}, tick {} ms",
        cfg.ui.long_press_ms, cfg.ui.mode_select, cfg.ui.tick_ms
    );
    let labels: Vec<&str> = ctl.presets().iter().map(|p| p.label.as_str()).collect();
    println!("presets: {}", labels.join(", "));
    Ok(())
}
