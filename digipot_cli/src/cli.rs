//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "digipot",
    version,
    about = "Rotary-encoder controller for SPI digital potentiometers"
)]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/digipot.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON, and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the encoder/menu dispatch loop until Ctrl-C or end of input
    #[command(long_about = "Run the encoder/menu dispatch loop.\n\n\
        With the `hardware` feature, edges come from GPIO interrupts and writes go to SPI.\n\
        Otherwise simulated encoder commands are read line by line from --script or stdin:\n\
        \n  cw [n] | ccw [n]            slow clicks (fine steps)\n\
        \n  fast-cw [n] | fast-ccw [n]  fast clicks (coarse steps)\n\
        \n  press                       short button press\n\
        \n  hold <ms>                   press and hold\n\
        \n  wait <ms>                   idle time\n\
        \n  quit                        stop reading input\n\
        \nBlank lines and lines starting with '#' are ignored.")]
    Run {
        /// Read simulator commands from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        script: Option<PathBuf>,
        /// Print final state and counters on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Map a resistance to a wiper step, or a step to its resistance
    Convert {
        /// Resistance in ohms
        #[arg(long, value_name = "OHMS", conflicts_with = "step", required_unless_present = "step")]
        ohms: Option<f64>,
        /// Wiper step
        #[arg(long, value_name = "STEP")]
        step: Option<u32>,
    },
    /// Bring-up sweep: write each preset, then every step from 0 to max_steps
    Sweep {
        /// Pot to sweep (1-based)
        #[arg(long, value_name = "N", default_value_t = 1)]
        channel: usize,
        /// Dwell on each step, in milliseconds
        #[arg(long = "dwell-ms", value_name = "MS", default_value_t = 2_000)]
        dwell_ms: u64,
        /// Dwell on each preset, in milliseconds
        #[arg(long = "preset-dwell-ms", value_name = "MS", default_value_t = 10_000)]
        preset_dwell_ms: u64,
    },
    /// Validate the config and print the effective settings
    SelfCheck,
}
