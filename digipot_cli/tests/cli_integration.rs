use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use assert_cmd::Command;
use tempfile::tempdir;

const VALID: &str = r#"
[pins]
encoder_a = 22
encoder_b = 27
button = 17

[spi]
channels = [0, 1]

[range]
min_ohms = 100
max_ohms = 10000
max_steps = 128
default_ohms = 5000
"#;

fn write_config(dir: &tempfile::TempDir, toml: &str) -> PathBuf {
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn digipot(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("digipot").unwrap();
    cmd.arg("--config").arg(cfg).env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["convert", "--ohms", "5000"], 0, "step 64", "stdout")]
#[case(&["convert", "--step", "1"], 0, "Approx: 78.1 Ohms", "stdout")]
#[case(&["convert", "--step", "200"], 2, "max_steps", "stderr")]
#[case(&["convert"], 2, "required", "stderr")]
#[case(&["self-check"], 0, "config ok", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let assert = digipot(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn scripted_session_writes_the_adjusted_value() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    // pot 1 -> Variable -> one fast click up -> set
    digipot(&cfg)
        .arg("run")
        .write_stdin("press\npress\nfast-cw\npress\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pot 1 | Step: 65 | Approx: 5078.1 Ohms"))
        .stdout(predicate::str::contains("Approx set!"));
}

#[test]
fn json_run_prints_a_summary_only() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let out = digipot(&cfg)
        .args(["--json", "run"])
        .write_stdin("press\npress\nfast-cw\npress\n")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(v["page"], "pot_adjust");
    assert_eq!(v["target_ohms"], 5100);
    assert_eq!(v["target_step"], 65);
    assert_eq!(v["writes"], 1);
}

#[test]
fn long_hold_returns_to_main_select_with_reset_target() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let out = digipot(&cfg)
        .args(["--json", "run"])
        .write_stdin("press\npress\nfast-cw 3\nhold 3500\n")
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["page"], "main_select");
    assert_eq!(v["target_ohms"], 5000);
    // the hold itself still set 5300 before the release reset
    assert_eq!(v["writes"], 1);
}

#[test]
fn constant_preset_is_written_from_a_script_file() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let script = dir.path().join("session.txt");
    // pot 2 -> Constant -> default preset (5k) -> one click to 10k -> set
    fs::write(
        &script,
        "# pick the second pot\ncw\npress\ncw\npress\ncw\npress\n",
    )
    .unwrap();
    digipot(&cfg)
        .args(["run", "--stats", "--script"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pot 2 | Step: 128 | Approx: 10000.0 Ohms"))
        .stdout(predicate::str::contains("Value set!"))
        .stdout(predicate::str::contains("writes: 1"));
}

#[test]
fn bad_script_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    digipot(&cfg)
        .arg("run")
        .write_stdin("jump\npress\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown command"));
}

#[rstest]
#[case("[pins]\nencoder_a = 22\nencoder_b = 22\nbutton = 17\n", "must be distinct")]
#[case("[spi]\nchannels = [0]\n", "pins")]
#[case(
    "[pins]\nencoder_a = 22\nencoder_b = 27\nbutton = 17\n[range]\nmax_steps = 300\n",
    "range.max_steps"
)]
fn invalid_config_exits_with_two(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, toml);
    digipot(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_config_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("nope.toml");
    let out = digipot(&cfg).args(["--json", "self-check"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let v: serde_json::Value = serde_json::from_slice(&out.stderr).unwrap();
    assert_eq!(v["reason"], "Config");
}

#[test]
fn file_logging_creates_the_log_file() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("digipot.log");
    let toml = format!(
        "{VALID}\n[logging]\nfile = \"{}\"\nlevel = \"debug\"\n",
        log.display()
    );
    let cfg = write_config(&dir, &toml);
    digipot(&cfg).arg("self-check").assert().success();
    assert!(log.exists());
}

#[test]
fn sweep_prints_presets_then_every_step() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let out = digipot(&cfg)
        .args(["sweep", "--dwell-ms", "0", "--preset-dwell-ms", "0"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let points: Vec<&str> = stdout.lines().filter(|l| l.starts_with("Step:")).collect();
    assert_eq!(points.len(), 4 + 129);
    assert_eq!(points[0], "Step:   1 | Approx:    78.1 Ohms");
    assert_eq!(points[3], "Step: 128 | Approx: 10000.0 Ohms");
    assert_eq!(points[4], "Step:   0 | Approx:     0.0 Ohms");
    assert_eq!(points[132], "Step: 128 | Approx: 10000.0 Ohms");
    assert!(stdout.contains("Pot 1: presets"));
    assert!(stdout.contains("Pot 1: steps 0..=128"));
    // the simulated bus stays quiet during a sweep
    assert!(!stdout.contains("Pot 1 |"));
}

#[test]
fn sweep_json_emits_one_object_per_point() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    let out = digipot(&cfg)
        .args(["--json", "sweep", "--channel", "2", "--dwell-ms", "0", "--preset-dwell-ms", "0"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8(out.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 133);
    assert_eq!(lines[0]["phase"], "presets");
    assert_eq!(lines[0]["channel"], 2);
    assert_eq!(lines[2]["step"], 64);
    assert_eq!(lines[132]["phase"], "steps");
    assert_eq!(lines[132]["approx_ohms"], 10_000.0);
}

#[rstest]
#[case("0")]
#[case("3")]
fn sweep_rejects_unknown_channel(#[case] channel: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, VALID);
    digipot(&cfg)
        .args(["sweep", "--channel", channel, "--dwell-ms", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("spi.channels"));
}
