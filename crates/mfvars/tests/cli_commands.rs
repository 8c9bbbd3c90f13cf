#![cfg(feature = "cli")]

use std::process::{Command, Output};

const ALT: &str = "(A:PLANE ALTITUDE,Feet)";
const HDG: &str = "(L:A32NX_AUTOPILOT_HEADING_SELECTED)";

fn mfvars(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mfvars"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("mfvars should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn get_prints_seeded_and_zero_values() {
    let output = mfvars(&["--seed", &format!("{ALT}=1234.5"), "get", ALT, HDG]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);

    let variables = &lines[0]["variables"];
    assert_eq!(variables[0]["name"], ALT);
    assert_eq!(variables[0]["value"], 1234.5);
    assert_eq!(variables[0]["offset"], 0);
    assert_eq!(variables[1]["name"], HDG);
    assert_eq!(variables[1]["state"], "confirmed-zero");
    assert_eq!(variables[1]["offset"], 4);
    assert_eq!(lines[0]["lifecycle"], "fixed");
}

#[test]
fn get_over_negotiated_channels() {
    let output = mfvars(&[
        "--negotiate",
        "--client-name",
        "Cockpit",
        "--seed",
        &format!("{ALT}=1234.5"),
        "get",
        ALT,
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["client"], "Cockpit");
    assert_eq!(lines[0]["lifecycle"], "negotiated");
    assert_eq!(lines[0]["variables"][0]["value"], 1234.5);
}

#[test]
fn set_then_read_back() {
    let output = mfvars(&[
        "set",
        "1 (>L:A32NX_COCKPIT_DOOR_LOCKED)",
        "--read",
        "(L:A32NX_COCKPIT_DOOR_LOCKED)",
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["sent"], true);
    assert_eq!(lines[0]["command_area"], "MobiFlight.Command");
    assert_eq!(lines[1]["variables"][0]["value"], 1.0);
}

#[test]
fn oversized_set_returns_usage_code() {
    let expr = format!("{} (>L:A)", "9".repeat(300));
    let output = mfvars(&["set", &expr]);

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("command too long"));
}

#[test]
fn invalid_client_name_returns_usage_code() {
    let output = mfvars(&["--negotiate", "--client-name", "two words", "get", ALT]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn watch_stops_after_count() {
    let output = mfvars(&[
        "--seed",
        &format!("{ALT}=100"),
        "watch",
        ALT,
        "--interval",
        "10ms",
        "--count",
        "2",
    ]);

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["reading"], 1);
    assert_eq!(lines[1]["reading"], 2);
    assert_eq!(lines[1]["variables"][0]["value"], 100.0);
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_mfvars"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("mfvars {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_reports_compiler() {
    let output = Command::new(env!("CARGO_BIN_EXE_mfvars"))
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rustc = stdout
        .lines()
        .find_map(|line| line.strip_prefix("rustc: "))
        .expect("rustc line");
    assert!(rustc.starts_with("rustc "), "unexpected rustc line: {rustc}");
    assert!(stdout.lines().any(|line| line.starts_with("git_hash: ")));
}
