// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

#![allow(dead_code)]

use dd_procbridge::ProcessMetadata;
use nix::sys::signal;
use nix::unistd::Pid;
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Metadata for `command` under `/bin/sh`, logging to `log_path`.
pub fn sh(name: &str, command: &str, log_path: &Path) -> ProcessMetadata {
    ProcessMetadata {
        name: name.to_string(),
        shell: "/bin/sh".to_string(),
        command: command.to_string(),
        log_path: log_path.to_string_lossy().into_owned(),
        args: vec![],
    }
}

/// Convert a pid returned by `run`, failing the test on a sentinel.
pub fn expect_pid(pid: i64) -> u32 {
    assert!(pid > 0, "run returned sentinel {pid}");
    u32::try_from(pid).unwrap_or_else(|_| panic!("pid {pid} out of range"))
}

/// Check if a PID is still alive. Zombies count as alive here.
pub fn pid_is_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    signal::kill(Pid::from_raw(pid), None).is_ok()
}

/// Wait until a PID is no longer alive, or timeout.
pub fn wait_for_pid_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !pid_is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Poll `path` until it holds exactly `expected`, or timeout. Returns the
/// last contents read.
pub fn wait_for_file_contents(path: &Path, expected: &str, timeout: Duration) -> String {
    let deadline = Instant::now() + timeout;
    loop {
        let contents = std::fs::read_to_string(path).unwrap_or_default();
        if contents == expected || Instant::now() >= deadline {
            return contents;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// Run the `dd-procbridge` binary with `args`, isolated from any host config.
pub fn procbridge_cli(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dd-procbridge"))
        .env("DD_PROCBRIDGE_CONFIG", config_dir.join("procbridge.yaml"))
        .args(args)
        .output()
        .expect("failed to run dd-procbridge")
}

/// Value printed by a CLI invocation. Log lines share stdout, so this is
/// the last line that parses as an integer.
pub fn cli_value(output: &Output) -> i64 {
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .rev()
        .find_map(|l| l.trim().parse().ok())
        .unwrap_or_else(|| panic!("unexpected CLI stdout: {stdout:?}"))
}
