// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use super::SignalError;

fn send(pid: i32, sig: Option<Signal>) -> Result<(), SignalError> {
    signal::kill(Pid::from_raw(pid), sig).map_err(|e| match e {
        Errno::ESRCH => SignalError::NoSuchProcess,
        Errno::EPERM => SignalError::PermissionDenied,
        other => SignalError::Other(other.to_string()),
    })
}

/// Graceful termination: SIGTERM.
pub fn request_termination(pid: i32) -> Result<(), SignalError> {
    send(pid, Some(Signal::SIGTERM))
}

pub fn force_kill(pid: i32) -> Result<(), SignalError> {
    send(pid, Some(Signal::SIGKILL))
}

/// Signal-0 probe. A process we lack permission to signal still exists;
/// a zombie waiting for its parent to reap it does not.
pub fn is_alive(pid: i32) -> bool {
    match send(pid, None) {
        Err(SignalError::NoSuchProcess) => false,
        _ => !is_zombie(pid),
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: i32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, rest) = stat.rsplit_once(')')?;
            rest.split_whitespace().next().map(|s| s == "Z" || s == "X")
        })
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: i32) -> bool {
    false
}

/// Kernel start time of `pid` in clock ticks since boot (`/proc/<pid>/stat`
/// field 22).
#[cfg(target_os = "linux")]
pub fn start_token(pid: u32) -> Option<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    parse_start_time(&stat)
}

#[cfg(not(target_os = "linux"))]
pub fn start_token(_pid: u32) -> Option<u64> {
    None
}

// The comm field may contain spaces and parentheses, so fields are counted
// from the last ')'. Field 3 (state) is the first one after it.
#[cfg(target_os = "linux")]
fn parse_start_time(stat: &str) -> Option<u64> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(19)?.parse().ok()
}
