#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn picobus(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_picobus"))
        .arg("--log-level")
        .arg("error")
        .arg("--simulate")
        .arg("--settle")
        .arg("0ms")
        .args(args)
        .output()
        .expect("picobus should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn send_temp_prints_decoded_json() {
    let output = picobus(&["--format", "json", "send", "TEMP"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    let value = &lines[0];
    assert_eq!(value["address"], "0x42");
    assert_eq!(value["command"], "TEMP");
    assert_eq!(value["outcome"], "decoded");
    assert_eq!(value["text"], "23.5C");
    assert_eq!(value["attempts"], 1);
    assert_eq!(value["transport_failures"], 0);
}

#[test]
fn send_raw_writes_payload_bytes_only() {
    let output = picobus(&["--format", "raw", "send", "ID"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"E6614104035B2A2C");
}

#[test]
fn send_non_ascii_exits_data_invalid() {
    let output = picobus(&["--format", "json", "send", "t\u{e9}mp"]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("non-ASCII"));
}

#[test]
fn send_oversized_command_exits_data_invalid() {
    let output = picobus(&["--max-len", "4", "--format", "json", "send", "TOOLONG"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn huge_max_len_exits_usage() {
    let output = picobus(&[
        "--max-len",
        "18446744073709551615",
        "--format",
        "json",
        "send",
        "TEMP",
    ]);
    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_len exceeds 8192 bytes"));
    assert!(output.stdout.is_empty());
}

#[test]
fn custom_address_is_reported() {
    let output = picobus(&["--address", "0x3E", "--format", "json", "send", "ping"]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["address"], "0x3E");
    assert_eq!(lines[0]["text"], "ping");
}

#[test]
fn repl_exchanges_each_line_until_quit() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_picobus"))
        .args(["--log-level", "error", "--simulate", "--settle", "0ms"])
        .args(["--format", "json", "repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("repl should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"TEMP\n\nhello\nworld\nQ\nignored\n")
        .expect("stdin write should succeed");

    let output = child.wait_with_output().expect("repl should exit");
    assert!(output.status.success());

    let lines = json_lines(&output);
    let texts: Vec<_> = lines
        .iter()
        .map(|v| v["text"].as_str().unwrap_or_default().to_string())
        .collect();
    // The reference peripheral answers plain text with the previous message.
    assert_eq!(texts, vec!["23.5C", "hello", "hello"]);
}

#[test]
fn poll_runs_requested_cycles() {
    let output = picobus(&[
        "--format",
        "json",
        "poll",
        "Hi from RPi!",
        "--interval",
        "10ms",
        "--count",
        "3",
    ]);
    assert!(output.status.success());
    assert_eq!(json_lines(&output).len(), 3);
}

#[test]
fn doctor_skips_device_checks_when_simulated() {
    let output = picobus(&["--format", "json", "doctor"]);
    assert_eq!(output.status.code(), Some(0));
    let lines = json_lines(&output);
    let checks = lines[0]["checks"].as_array().expect("checks array");
    let device = checks
        .iter()
        .find(|c| c["name"] == "bus_device")
        .expect("bus_device check present");
    assert_eq!(device["status"], "skip");
    assert_eq!(lines[0]["overall"], "pass");
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_picobus"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("picobus "));
}
