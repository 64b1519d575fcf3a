// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info};
use std::process::Child;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::errors::{Error, Result};
use crate::launcher;
use crate::metadata::ProcessMetadata;
use crate::os;
use crate::state::ProcessState;
use crate::table::{ProcessRecord, ProcessTable};
use crate::terminator::{self, StopOutcome};

static SUPERVISOR: LazyLock<Supervisor> = LazyLock::new(|| Supervisor::new(Config::from_env()));

/// The process-wide supervisor behind the boundary functions. Created on first
/// use and never torn down.
pub fn global() -> &'static Supervisor {
    &SUPERVISOR
}

/// What `stop` found in the table, captured under the lock so the
/// signalling can happen without it.
enum Target {
    Untracked,
    Child { name: String, child: Child },
    Unknown { name: String, token: Option<u64> },
}

/// Owns the process table. The lock only covers table lookups and updates;
/// spawning and signalling happen outside it.
#[derive(Debug, Default)]
pub struct Supervisor {
    config: Config,
    table: Mutex<ProcessTable>,
}

/// Pids the OS could address as a single process. Zero and negative values
/// would address process groups.
fn os_pid(pid: i64) -> Option<i32> {
    i32::try_from(pid).ok().filter(|p| *p > 0)
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            table: Mutex::new(ProcessTable::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn table(&self) -> MutexGuard<'_, ProcessTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn one child for `metadata` and start tracking it.
    pub fn run(&self, metadata: &ProcessMetadata) -> Result<u32> {
        // The sweep is the one syscall made under the lock: a WNOHANG wait
        // per Running record, which never blocks.
        let reaped = self.table().reap_exited();
        if reaped > 0 {
            debug!("reaped {reaped} exited child(ren)");
        }

        let process = launcher::launch(metadata, &self.config.runner)?;
        let pid = process.pid;
        self.table().insert(process);
        Ok(pid)
    }

    /// Terminate `pid` following the configured stop policy.
    pub fn stop(&self, pid: i64) -> Result<StopOutcome> {
        let Some(os_pid) = os_pid(pid) else {
            debug!("refusing to signal pid {pid}");
            return Err(Error::NotFound { pid });
        };
        let key = os_pid.unsigned_abs();

        let target = {
            let mut table = self.table();
            match table.get_mut(key) {
                None => Target::Untracked,
                Some(rec) => match rec.state() {
                    state if state.is_terminal() => {
                        debug!("[{}] already {state} (pid={pid})", rec.name);
                        return Ok(StopOutcome::AlreadyGone);
                    }
                    ProcessState::Stopping => return Ok(StopOutcome::InProgress),
                    ProcessState::Running => match rec.take_child() {
                        Some(child) => {
                            rec.transition(ProcessState::Stopping);
                            Target::Child {
                                name: rec.name.clone(),
                                child,
                            }
                        }
                        None => Target::Unknown {
                            name: rec.name.clone(),
                            token: rec.start_token(),
                        },
                    },
                    _ => Target::Unknown {
                        name: rec.name.clone(),
                        token: rec.start_token(),
                    },
                },
            }
        };

        match target {
            Target::Untracked => terminator::terminate_untracked(os_pid, &self.config.stop),
            Target::Child { name, mut child } => {
                let result = terminator::terminate_child(&name, &mut child, &self.config.stop);
                self.settle(key, child, &result);
                match result {
                    Ok(StopOutcome::Lost) => Ok(StopOutcome::AlreadyGone),
                    other => other,
                }
            }
            Target::Unknown { name, token } => self.stop_unknown(key, os_pid, &name, token),
        }
    }

    /// Record the result of terminating a tracked child. The record is only
    /// touched if it is still the one this call moved to Stopping.
    fn settle(&self, key: u32, child: Child, result: &Result<StopOutcome>) {
        let mut table = self.table();
        let Some(rec) = table.get_mut(key) else {
            return;
        };
        if rec.state() != ProcessState::Stopping {
            debug!("[{}] record replaced while stopping (pid={key})", rec.name);
            return;
        }
        match result {
            Ok(StopOutcome::Terminated) => {
                info!("[{}] stopped (pid={key})", rec.name);
                rec.transition(ProcessState::Stopped);
            }
            Ok(StopOutcome::AlreadyGone) => {
                rec.transition(ProcessState::Exited);
            }
            Ok(StopOutcome::Lost) => {
                rec.transition(ProcessState::Unknown);
            }
            Ok(StopOutcome::Accepted | StopOutcome::InProgress) | Err(_) => {
                rec.restore_child(child);
                rec.transition(ProcessState::Running);
            }
        }
    }

    /// A record whose process the supervisor lost track of. The start-time
    /// token tells whether the pid still names that process; without one the
    /// OS is asked directly.
    fn stop_unknown(
        &self,
        key: u32,
        os_pid: i32,
        name: &str,
        token: Option<u64>,
    ) -> Result<StopOutcome> {
        if token.is_some() && os::start_token(key) != token {
            debug!("[{name}] pid {key} no longer names the original process");
            return Ok(StopOutcome::AlreadyGone);
        }
        let outcome = terminator::terminate_untracked(os_pid, &self.config.stop)?;
        if outcome == StopOutcome::Terminated
            && let Some(rec) = self.table().get_mut(key)
            && rec.state() == ProcessState::Unknown
        {
            rec.transition(ProcessState::Stopped);
        }
        Ok(outcome)
    }

    /// Snapshot of the record for `pid`, if one exists.
    pub fn record(&self, pid: i64) -> Option<ProcessRecord> {
        let key = os_pid(pid)?.unsigned_abs();
        self.table().get(key).map(|rec| rec.snapshot())
    }

    /// Number of records, including finished processes.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}
