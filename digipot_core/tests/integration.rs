use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as xch;
use digipot_core::display::{DETAIL, HEADER, OHMS, STATUS};
use digipot_core::mocks::{MemoryDisplay, RecordingBus};
use digipot_core::{
    Page, PotController, PotSink, Runner, SinkCfg, UnitConverter, controller_from_config,
    sink_from_config,
};
use digipot_traits::{InputEdge, InputLine, Level, Timestamp};

/// Raw edges for `clicks` clockwise detents starting at `t`, `gap_us` apart.
fn cw_edges(t: u64, clicks: u64, gap_us: u64) -> Vec<InputEdge> {
    let mut out = Vec::new();
    for i in 0..clicks {
        let base = t + i * gap_us;
        for (k, (line, level)) in [
            (InputLine::EncoderB, Level::High),
            (InputLine::EncoderA, Level::High),
            (InputLine::EncoderB, Level::Low),
            (InputLine::EncoderA, Level::Low),
        ]
        .into_iter()
        .enumerate()
        {
            out.push(InputEdge::new(line, level, Timestamp::from_micros(base + k as u64)));
        }
    }
    out
}

fn button(level: Level, us: u64) -> InputEdge {
    InputEdge::new(InputLine::Button, level, Timestamp::from_micros(us))
}

fn runner() -> Runner<RecordingBus, MemoryDisplay> {
    Runner::new(
        PotController::builder().try_build().unwrap(),
        PotSink::new(
            RecordingBus::default(),
            UnitConverter::new(10_000, 128),
            SinkCfg::default(),
        ),
        MemoryDisplay::default(),
        Duration::from_millis(2),
    )
}

#[test]
fn edges_through_channel_set_the_wiper() {
    let mut r = runner();
    let (tx, rx) = xch::unbounded();

    // pick pot 2, variable mode, two fast clicks then a slow one, press
    let mut script = cw_edges(0, 1, 0);
    script.push(button(Level::High, 100_000));
    script.push(button(Level::Low, 150_000));
    script.push(button(Level::High, 400_000));
    script.push(button(Level::Low, 450_000));
    script.extend(cw_edges(500_000, 2, 20_000));
    script.extend(cw_edges(1_600_000, 1, 0));
    script.push(button(Level::High, 2_000_000));
    script.push(button(Level::Low, 2_100_000));
    for e in script {
        tx.send(e).unwrap();
    }
    drop(tx);

    let stats = r.run(&rx, &AtomicBool::new(false)).unwrap();
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.skipped_writes, 0);

    let ctl = r.controller();
    assert_eq!(ctl.page(), Page::PotAdjust);
    assert_eq!(ctl.selected_channel(), 1);
    // first click coarse (+100), second 20 ms later coarse (+100), slow +10
    assert_eq!(ctl.target_ohms(), 5_210);

    let (_, sink, display) = r.into_parts();
    assert_eq!(sink.bus().writes(), &[(1, [0x00, 66])]);
    assert_eq!(display.line(HEADER), "Pot 2");
    assert_eq!(display.line(OHMS), "Ohms: 5210");
    assert_eq!(display.line(STATUS), "Approx set!");
    assert!(display.line(DETAIL).starts_with("Pot 2: 5156."));
}

#[test]
fn many_updates_between_ticks_coalesce() {
    let mut r = runner();
    r.handle(digipot_core::Event::Tick).unwrap();
    let before = r.display().updates(OHMS);
    // five menu toggles, no tick in between
    for e in cw_edges(0, 5, 20_000) {
        r.handle(e.into()).unwrap();
    }
    assert_eq!(r.controller().menu_selection(), 1);
    assert_eq!(r.display().updates(OHMS), before);
    r.handle(digipot_core::Event::Tick).unwrap();
    assert_eq!(r.display().updates(OHMS), before + 1);
    assert_eq!(r.display().line(OHMS), "  Pot 1");
    assert_eq!(r.display().line(STATUS), "> Pot 2");
}

#[test]
fn shutdown_flag_stops_a_live_loop() {
    let shutdown = Arc::new(AtomicBool::new(false));
    let (tx, rx) = xch::unbounded::<InputEdge>();
    let flag = shutdown.clone();
    let handle = std::thread::spawn(move || {
        let mut r = runner();
        r.run(&rx, &flag).map(|s| s.ticks)
    });
    std::thread::sleep(Duration::from_millis(20));
    shutdown.store(true, Ordering::Relaxed);
    let ticks = handle.join().unwrap().unwrap();
    assert!(ticks >= 2);
    drop(tx);
}

#[test]
fn config_file_drives_controller_and_sink() {
    let toml = r#"
[pins]
encoder_a = 22
encoder_b = 27
button = 17

[spi]
channels = [0]
command = 0x11

[range]
max_ohms = 50000
max_steps = 255
default_ohms = 25000

[ui]
mode_select = false
"#;
    let cfg = digipot_config::load_toml(toml).unwrap();
    cfg.validate().unwrap();
    let ctl = controller_from_config(&cfg).unwrap();
    let sink = sink_from_config(RecordingBus::default(), &cfg);
    let mut r = Runner::new(ctl, sink, MemoryDisplay::default(), Duration::from_millis(5));

    r.handle(button(Level::High, 0).into()).unwrap();
    assert_eq!(r.controller().page(), Page::PotAdjust);
    r.handle(button(Level::High, 500_000).into()).unwrap();
    // 25000 / 50000 * 255 = 127.5 -> 127
    assert_eq!(r.sink().bus().writes(), &[(0, [0x11, 127])]);
}
