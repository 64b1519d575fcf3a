// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid process metadata: {reason}")]
    InvalidMetadata { reason: String },

    #[error("could not open log file {}: {source}", path.display())]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: io::Error,
    },

    #[error("no such process: {pid}")]
    NotFound { pid: i64 },

    #[error("not permitted to signal pid {pid}")]
    PermissionDenied { pid: i64 },

    #[error("failed to terminate pid {pid}: {reason}")]
    Termination { pid: i64, reason: String },
}

impl Error {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Error::InvalidMetadata {
            reason: reason.into(),
        }
    }

    /// Code reported by `run` for this error.
    pub fn run_code(&self) -> i64 {
        match self {
            Error::InvalidMetadata { .. } => status::RUN_INVALID_METADATA,
            Error::LogOpen { .. } => status::RUN_LOG_OPEN_FAILED,
            _ => status::RUN_SPAWN_FAILED,
        }
    }

    /// Code reported by `stop` for this error.
    pub fn stop_code(&self) -> i64 {
        match self {
            Error::NotFound { .. } | Error::InvalidMetadata { .. } => status::STOP_NOT_FOUND,
            Error::PermissionDenied { .. } => status::STOP_PERMISSION_DENIED,
            _ => status::STOP_TERMINATION_FAILED,
        }
    }
}
