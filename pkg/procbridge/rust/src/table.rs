// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Child;

use crate::state::ProcessState;

/// A child spawned by the launcher and owned by the table.
#[derive(Debug)]
pub struct SupervisedProcess {
    pub pid: u32,
    pub name: String,
    pub log_path: PathBuf,
    state: ProcessState,
    start_token: Option<u64>,
    /// Present while the child is unreaped and no `stop` call holds it.
    child: Option<Child>,
}

/// Copy of a record's diagnostic fields, safe to hand out past the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub log_path: PathBuf,
    pub state: ProcessState,
    pub start_token: Option<u64>,
}

impl SupervisedProcess {
    pub fn new(name: String, log_path: PathBuf, child: Child, start_token: Option<u64>) -> Self {
        Self {
            pid: child.id(),
            name,
            log_path,
            state: ProcessState::Running,
            start_token,
            child: Some(child),
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn start_token(&self) -> Option<u64> {
        self.start_token
    }

    /// Move to `next` if the transition is legal; illegal ones are logged and ignored.
    pub(crate) fn transition(&mut self, next: ProcessState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_transition_to(next) {
            warn!(
                "[{}] ignoring invalid transition {} -> {next} (pid={})",
                self.name, self.state, self.pid
            );
            return false;
        }
        debug!("[{}] {} -> {next} (pid={})", self.name, self.state, self.pid);
        self.state = next;
        true
    }

    pub(crate) fn take_child(&mut self) -> Option<Child> {
        self.child.take()
    }

    pub(crate) fn restore_child(&mut self, child: Child) {
        self.child = Some(child);
    }

    pub fn snapshot(&self) -> ProcessRecord {
        ProcessRecord {
            pid: self.pid,
            name: self.name.clone(),
            log_path: self.log_path.clone(),
            state: self.state,
            start_token: self.start_token,
        }
    }
}

/// In-memory map from OS pid to supervised record. Records are never removed;
/// a pid reused by a later spawn replaces the stale record.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: HashMap<u32, SupervisedProcess>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, process: SupervisedProcess) {
        if let Some(old) = self.processes.get(&process.pid) {
            debug!(
                "[{}] pid {} reused, replacing {} record for {}",
                process.name, process.pid, old.state, old.name
            );
        }
        self.processes.insert(process.pid, process);
    }

    pub fn get(&self, pid: u32) -> Option<&SupervisedProcess> {
        self.processes.get(&pid)
    }

    pub fn get_mut(&mut self, pid: u32) -> Option<&mut SupervisedProcess> {
        self.processes.get_mut(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Reap children that exited on their own. Uses non-blocking waits only.
    pub fn reap_exited(&mut self) -> usize {
        let mut reaped = 0;
        for proc in self.processes.values_mut() {
            // Stopping records have lent their child to a `stop` call.
            if !proc.state.is_alive() {
                continue;
            }
            let Some(child) = proc.child.as_mut() else {
                continue;
            };
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("[{}] exited with {status} (pid={})", proc.name, proc.pid);
                    proc.child = None;
                    proc.transition(ProcessState::Exited);
                    reaped += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("[{}] wait failed (pid={}): {e}", proc.name, proc.pid);
                    proc.child = None;
                    proc.transition(ProcessState::Unknown);
                }
            }
        }
        reaped
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_possible_wrap)]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::time::{Duration, Instant};

    fn spawn(cmd: &str) -> Child {
        Command::new("/bin/sh")
            .args(["-c", cmd])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn /bin/sh")
    }

    fn record(name: &str, child: Child) -> SupervisedProcess {
        SupervisedProcess::new(name.into(), PathBuf::from("/dev/null"), child, None)
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = ProcessTable::new();
        assert!(table.is_empty());

        let proc = record("sleeper", spawn("sleep 60"));
        let pid = proc.pid;
        table.insert(proc);

        let rec = table.get(pid).unwrap();
        assert_eq!(rec.name, "sleeper");
        assert_eq!(rec.state(), ProcessState::Running);
        assert_eq!(table.len(), 1);

        let mut child = table.get_mut(pid).unwrap().take_child().unwrap();
        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_transition_rejects_invalid() {
        let mut proc = record("t", spawn("exit 0"));
        assert!(!proc.transition(ProcessState::Stopped));
        assert_eq!(proc.state(), ProcessState::Running);
        assert!(proc.transition(ProcessState::Stopping));
        assert!(proc.transition(ProcessState::Stopped));
        assert!(!proc.transition(ProcessState::Running));
        proc.take_child().unwrap().wait().unwrap();
    }

    #[test]
    fn test_reap_exited() {
        let mut table = ProcessTable::new();
        let quick = record("quick", spawn("exit 3"));
        let slow = record("slow", spawn("sleep 60"));
        let (quick_pid, slow_pid) = (quick.pid, slow.pid);
        table.insert(quick);
        table.insert(slow);

        let deadline = Instant::now() + Duration::from_secs(5);
        while table.get(quick_pid).unwrap().state() == ProcessState::Running {
            assert!(Instant::now() < deadline, "quick child never reaped");
            table.reap_exited();
            std::thread::sleep(Duration::from_millis(20));
        }

        assert_eq!(table.get(quick_pid).unwrap().state(), ProcessState::Exited);
        assert_eq!(table.get(slow_pid).unwrap().state(), ProcessState::Running);

        let mut child = table.get_mut(slow_pid).unwrap().take_child().unwrap();
        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_reap_exited_does_not_block() {
        let mut table = ProcessTable::new();
        let slow = record("slow", spawn("sleep 60"));
        let pid = slow.pid;
        table.insert(slow);

        let started = Instant::now();
        assert_eq!(table.reap_exited(), 0);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(table.get(pid).unwrap().state(), ProcessState::Running);

        let mut child = table.get_mut(pid).unwrap().take_child().unwrap();
        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_reap_wait_failure_marks_unknown() {
        let mut table = ProcessTable::new();
        let proc = record("lost", spawn("exit 0"));
        let pid = proc.pid;
        table.insert(proc);

        let status = nix::sys::wait::waitpid(nix::unistd::Pid::from_raw(pid as i32), None).unwrap();
        assert!(matches!(status, nix::sys::wait::WaitStatus::Exited(_, 0)));

        assert_eq!(table.reap_exited(), 0);
        let rec = table.get(pid).unwrap();
        assert_eq!(rec.state(), ProcessState::Unknown);
        assert!(table.get_mut(pid).unwrap().take_child().is_none());
    }

    #[test]
    fn test_snapshot() {
        let mut proc = record("snap", spawn("exit 0"));
        let snap = proc.snapshot();
        assert_eq!(snap.pid, proc.pid);
        assert_eq!(snap.name, "snap");
        assert_eq!(snap.state, ProcessState::Running);
        assert_eq!(snap.start_token, None);
        proc.take_child().unwrap().wait().unwrap();
    }
}
