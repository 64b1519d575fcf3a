// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Platform layer: termination requests, liveness probes and the start-time
//! token used to tell a process apart from a later one reusing its pid.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{force_kill, is_alive, request_termination, start_token};
#[cfg(windows)]
pub use windows::{force_kill, is_alive, request_termination, start_token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    NoSuchProcess,
    PermissionDenied,
    Other(String),
}

impl std::fmt::Display for SignalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalError::NoSuchProcess => write!(f, "no such process"),
            SignalError::PermissionDenied => write!(f, "permission denied"),
            SignalError::Other(e) => write!(f, "{e}"),
        }
    }
}
