// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned and believed alive.
    Running,
    /// A `stop` call has taken the child handle and is terminating it.
    Stopping,
    /// Terminated by `stop`.
    Stopped,
    /// Reaped after exiting on its own.
    Exited,
    /// The OS lost track of the pid (reaped elsewhere or reused).
    Unknown,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Stopping)
    }

    /// Terminal states never lead to a signal being sent to the pid again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Stopped | ProcessState::Exited)
    }

    pub(crate) fn can_transition_to(self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (Running, Stopping)
                | (Running, Exited)
                | (Running, Unknown)
                | (Stopping, Running)
                | (Stopping, Stopped)
                | (Stopping, Exited)
                | (Stopping, Unknown)
                | (Unknown, Stopped)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Stopping => write!(f, "stopping"),
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Exited => write!(f, "exited"),
            ProcessState::Unknown => write!(f, "unknown"),
        }
    }
}
