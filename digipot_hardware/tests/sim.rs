use std::sync::{Arc, Mutex};
use std::time::Duration;

use digipot_hardware::error::HwError;
use digipot_hardware::util::{glitch_filter, normalize_level};
use digipot_hardware::{ConsoleDisplay, ScriptTiming, ScriptedEncoder, SimCommand, SimulatedBus};
use digipot_traits::{EdgeSource, InputEdge, InputLine, Level, LineDisplay, PotBus, Timestamp};
use rstest::rstest;

fn combined_states(edges: &[InputEdge]) -> Vec<u8> {
    let (mut a, mut b) = (0u8, 0u8);
    edges
        .iter()
        .filter_map(|e| {
            match e.line {
                InputLine::EncoderA => a = e.level.bit(),
                InputLine::EncoderB => b = e.level.bit(),
                InputLine::Button => return None,
            }
            Some((a << 1) | b)
        })
        .collect()
}

#[rstest]
#[case(false, false, Level::Low)]
#[case(true, false, Level::High)]
#[case(false, true, Level::High)]
#[case(true, true, Level::Low)]
fn levels_are_normalized(#[case] raw_high: bool, #[case] active_low: bool, #[case] want: Level) {
    assert_eq!(normalize_level(raw_high, active_low), want);
}

#[rstest]
#[case(InputLine::Button, Some(50_000), Some(Duration::from_millis(50)))]
#[case(InputLine::Button, None, None)]
#[case(InputLine::Button, Some(0), None)]
#[case(InputLine::EncoderA, Some(50_000), None)]
#[case(InputLine::EncoderB, Some(50_000), None)]
fn glitch_filter_applies_to_the_button_only(
    #[case] line: InputLine,
    #[case] glitch_us: Option<u64>,
    #[case] want: Option<Duration>,
) {
    assert_eq!(glitch_filter(line, glitch_us), want);
}

#[test]
fn clockwise_click_walks_the_gray_cycle() {
    let mut enc = ScriptedEncoder::new();
    enc.cw(2);
    assert_eq!(combined_states(enc.pending()), vec![1, 3, 2, 0, 1, 3, 2, 0]);
}

#[test]
fn counter_clockwise_click_walks_backwards() {
    let mut enc = ScriptedEncoder::new();
    enc.ccw(1);
    assert_eq!(combined_states(enc.pending()), vec![2, 3, 1, 0]);
}

#[test]
fn fast_clicks_are_closer_together() {
    let timing = ScriptTiming::default();
    let mut slow = ScriptedEncoder::new();
    slow.cw(1);
    let mut fast = ScriptedEncoder::new();
    fast.fast_cw(1);
    assert_eq!(
        slow.now().as_micros(),
        4 * timing.edge_us + timing.slow_gap_us
    );
    assert!(fast.now() < slow.now());
}

#[test]
fn hold_spaces_press_and_release() {
    let mut enc = ScriptedEncoder::new();
    enc.apply(SimCommand::Wait { ms: 10 })
        .apply(SimCommand::Hold { ms: 3_000 });
    let edges = enc.take_edges();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].level, Level::High);
    assert_eq!(edges[0].timestamp, Timestamp::from_micros(10_000));
    assert_eq!(edges[1].level, Level::Low);
    assert_eq!(
        edges[1].timestamp.micros_since(edges[0].timestamp),
        3_000_000
    );
    assert!(enc.pending().is_empty());
}

#[test]
fn edge_source_delivers_queued_edges_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut enc = ScriptedEncoder::new();
    enc.press().cw(1);
    enc.start(Arc::new(move |e| sink.lock().unwrap().push(e)))
        .unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 6);
    assert!(seen.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(seen[0].line, InputLine::Button);
}

#[test]
fn simulated_bus_records_and_describes() {
    let mut bus = SimulatedBus::new(2, 10_000, 128).quiet();
    bus.write(1, [0x00, 64]).unwrap();
    assert_eq!(bus.writes(), &[(1, [0x00, 64])]);
    assert_eq!(bus.describe(1, 64), "Pot 2 | Step: 64 | Approx: 5000.0 Ohms");
}

#[test]
fn simulated_bus_rejects_unknown_channel_with_hw_error() {
    let mut bus = SimulatedBus::new(1, 10_000, 128).quiet();
    let err = bus.write(1, [0, 1]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HwError>(),
        Some(HwError::UnknownChannel(1))
    ));
}

#[test]
fn console_display_keeps_lines() {
    let mut d = ConsoleDisplay::new(4).quiet();
    assert_eq!(d.lines(), 4);
    d.put_line(0, "Select a Pot:       ").unwrap();
    assert_eq!(d.line(0), Some("Select a Pot:"));
    assert!(d.put_line(7, "nope").is_err());
}

#[test]
fn catch_up_only_moves_forward() {
    let mut enc = ScriptedEncoder::new();
    enc.catch_up(Timestamp::from_micros(2_000_000)).press();
    assert_eq!(enc.pending()[0].timestamp, Timestamp::from_micros(2_000_000));
    let after = enc.now();
    enc.catch_up(Timestamp::from_micros(1));
    assert_eq!(enc.now(), after);
}
