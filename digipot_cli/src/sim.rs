//! Simulator input: parse `cw 3` / `press` / `hold 3500` lines into encoder
//! edges and push them down the dispatch channel.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use digipot_hardware::{ScriptedEncoder, SimCommand};
use digipot_traits::{Clock, EdgeSource, InputEdge};
use eyre::WrapErr;

/// One parsed simulator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLine {
    Command(SimCommand),
    Quit,
}

fn count(arg: Option<&str>) -> eyre::Result<u32> {
    match arg {
        None => Ok(1),
        Some(s) => {
            let n: u32 = s
                .parse()
                .wrap_err_with(|| format!("invalid click count '{s}'"))?;
            if n == 0 {
                eyre::bail!("click count must be >= 1");
            }
            Ok(n)
        }
    }
}

fn millis(arg: Option<&str>, cmd: &str) -> eyre::Result<u64> {
    let s = arg.ok_or_else(|| eyre::eyre!("'{cmd}' needs a duration in ms"))?;
    s.parse()
        .wrap_err_with(|| format!("invalid duration '{s}'"))
}

/// Parse one line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> eyre::Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let cmd = words.next().unwrap_or_default().to_ascii_lowercase();
    let arg = words.next();
    if let Some(extra) = words.next() {
        eyre::bail!("unexpected argument '{extra}' after '{cmd}'");
    }

    let parsed = match cmd.as_str() {
        "cw" => SimCommand::Clockwise {
            clicks: count(arg)?,
            fast: false,
        },
        "ccw" => SimCommand::CounterClockwise {
            clicks: count(arg)?,
            fast: false,
        },
        "fast-cw" => SimCommand::Clockwise {
            clicks: count(arg)?,
            fast: true,
        },
        "fast-ccw" => SimCommand::CounterClockwise {
            clicks: count(arg)?,
            fast: true,
        },
        "press" => SimCommand::Press,
        "hold" => SimCommand::Hold {
            ms: millis(arg, "hold")?,
        },
        "wait" => SimCommand::Wait {
            ms: millis(arg, "wait")?,
        },
        "quit" | "exit" => return Ok(Some(ScriptLine::Quit)),
        other => eyre::bail!("unknown command '{other}'"),
    };
    Ok(Some(ScriptLine::Command(parsed)))
}

/// Read commands until EOF, `quit` or shutdown, sending each command's edges
/// to `tx` as soon as it is parsed. Bad lines are logged and skipped.
///
/// Edge timestamps follow a virtual timeline that never falls behind `clock`,
/// so a pause between typed lines counts as idle time.
/// Returns the number of commands applied.
pub fn feed<R: BufRead, C: Clock>(
    input: R,
    clock: &C,
    tx: &Sender<InputEdge>,
    shutdown: &AtomicBool,
) -> eyre::Result<usize> {
    let epoch = clock.now();
    let sender = tx.clone();
    let on_edge: Arc<dyn Fn(InputEdge) + Send + Sync> = Arc::new(move |edge| {
        // the loop may already be gone during shutdown
        let _ = sender.send(edge);
    });

    let mut encoder = ScriptedEncoder::new();
    let mut applied = 0usize;
    for (idx, line) in input.lines().enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let line = line.wrap_err("reading simulator input")?;
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ScriptLine::Quit)) => break,
            Ok(Some(ScriptLine::Command(cmd))) => {
                tracing::debug!(line = idx + 1, ?cmd, "sim command");
                encoder.catch_up(clock.timestamp_since(epoch)).apply(cmd);
                encoder
                    .start(Arc::clone(&on_edge))
                    .map_err(|e| eyre::eyre!("scripted encoder: {e}"))?;
                applied += 1;
            }
            Err(e) => tracing::warn!(line = idx + 1, error = %e, "skipping simulator line"),
        }
    }
    Ok(applied)
}
