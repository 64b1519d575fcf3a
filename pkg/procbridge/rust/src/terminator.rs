// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Termination policy shared by tracked children and untracked pids:
//! graceful request, wait up to `stop.timeout_ms`, then (if `stop.escalate`)
//! forceful kill and wait up to `stop.kill_timeout_ms`.

use log::{debug, info, warn};
use std::process::Child;
use std::time::{Duration, Instant};

use crate::config::StopConfig;
use crate::errors::{Error, Result};
use crate::os::{self, SignalError};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited after being signalled.
    Terminated,
    /// Already gone before any signal was sent.
    AlreadyGone,
    /// Signalled but still running after the grace period; escalation is off.
    Accepted,
    /// Another caller is terminating it.
    InProgress,
    /// The child handle could no longer be waited on; the process is not ours anymore.
    Lost,
}

fn signal_error(pid: i64, err: SignalError) -> Error {
    match err {
        SignalError::NoSuchProcess => Error::NotFound { pid },
        SignalError::PermissionDenied => Error::PermissionDenied { pid },
        SignalError::Other(reason) => Error::Termination { pid, reason },
    }
}

/// Poll until `is_gone` reports true or `timeout` elapses. Checks at least once.
fn wait_until(timeout: Duration, mut is_gone: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if is_gone() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn child_exited(name: &str, child: &mut Child) -> bool {
    match child.try_wait() {
        Ok(Some(status)) => {
            info!("[{name}] exited with {status}");
            true
        }
        Ok(None) => false,
        Err(e) => {
            warn!("[{name}] wait failed (pid={}): {e}", child.id());
            true
        }
    }
}

/// Terminate a child spawned by the launcher, reaping it on exit.
pub fn terminate_child(name: &str, child: &mut Child, policy: &StopConfig) -> Result<StopOutcome> {
    let pid = i64::from(child.id());
    let os_pid = i32::try_from(child.id()).map_err(|_| Error::NotFound { pid })?;

    match child.try_wait() {
        Ok(Some(status)) => {
            info!("[{name}] already exited with {status} (pid={pid})");
            return Ok(StopOutcome::AlreadyGone);
        }
        Ok(None) => {}
        Err(e) => {
            warn!("[{name}] cannot wait on pid {pid}, treating as lost: {e}");
            return Ok(StopOutcome::Lost);
        }
    }

    info!("[{name}] sending SIGTERM (pid={pid})");
    match os::request_termination(os_pid) {
        Ok(()) => {}
        Err(SignalError::NoSuchProcess) => return Ok(StopOutcome::Lost),
        Err(e) => return Err(signal_error(pid, e)),
    }

    if wait_until(policy.grace_period(), || child_exited(name, child)) {
        return Ok(StopOutcome::Terminated);
    }
    if !policy.escalate {
        warn!(
            "[{name}] still running {}ms after SIGTERM, escalation disabled (pid={pid})",
            policy.timeout_ms
        );
        return Ok(StopOutcome::Accepted);
    }

    warn!(
        "[{name}] stop timeout ({}ms) reached, sending SIGKILL (pid={pid})",
        policy.timeout_ms
    );
    match os::force_kill(os_pid) {
        Ok(()) | Err(SignalError::NoSuchProcess) => {}
        Err(e) => return Err(signal_error(pid, e)),
    }
    if wait_until(policy.kill_timeout(), || child_exited(name, child)) {
        return Ok(StopOutcome::Terminated);
    }
    warn!("[{name}] still running after SIGKILL, giving up (pid={pid})");
    Err(Error::Termination {
        pid,
        reason: "still running after SIGKILL".to_string(),
    })
}

/// Best-effort termination of a pid this supervisor does not hold a handle
/// for. The pid may belong to any process the caller is allowed to signal.
pub fn terminate_untracked(os_pid: i32, policy: &StopConfig) -> Result<StopOutcome> {
    let pid = i64::from(os_pid);
    if u32::try_from(os_pid).is_ok_and(|p| p == std::process::id()) {
        warn!("refusing to terminate the hosting process (pid={pid})");
        return Err(Error::PermissionDenied { pid });
    }

    debug!("pid {pid} is not tracked, sending SIGTERM");
    os::request_termination(os_pid).map_err(|e| signal_error(pid, e))?;

    if wait_until(policy.grace_period(), || !os::is_alive(os_pid)) {
        info!("untracked pid {pid} terminated");
        return Ok(StopOutcome::Terminated);
    }
    if !policy.escalate {
        return Ok(StopOutcome::Accepted);
    }

    warn!(
        "untracked pid {pid} still running after {}ms, sending SIGKILL",
        policy.timeout_ms
    );
    match os::force_kill(os_pid) {
        Ok(()) => {}
        Err(SignalError::NoSuchProcess) => return Ok(StopOutcome::Terminated),
        Err(e) => return Err(signal_error(pid, e)),
    }
    if wait_until(policy.kill_timeout(), || !os::is_alive(os_pid)) {
        return Ok(StopOutcome::Terminated);
    }
    Err(Error::Termination {
        pid,
        reason: "still running after SIGKILL".to_string(),
    })
}
