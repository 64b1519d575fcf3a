// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::undocumented_unsafe_blocks)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod config;
mod errors;
pub mod ffi;
mod launcher;
mod metadata;
mod os;
mod state;
pub mod status;
mod supervisor;
mod table;
mod terminator;

use std::panic::{self, AssertUnwindSafe};

use log::{error, warn};

pub use config::Config;
pub use errors::{Error, Result};
pub use metadata::{ProcessMetadata, command_introducer};
pub use state::ProcessState;
pub use supervisor::{Supervisor, global};
pub use table::ProcessRecord;
pub use terminator::StopOutcome;

/// Run `f`, turning a panic into `on_panic`. Nothing unwinds past the
/// boundary functions.
pub(crate) fn guard(on_panic: i64, f: impl FnOnce() -> i64) -> i64 {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("internal panic, returning {on_panic}");
        on_panic
    })
}

/// Launch `metadata` under the process-wide supervisor.
///
/// Returns the child's pid on success, or one of the negative `status::RUN_*`
/// codes.
pub fn run(metadata: ProcessMetadata) -> i64 {
    guard(status::RUN_INTERNAL_ERROR, || {
        match supervisor::global().run(&metadata) {
            Ok(pid) => i64::from(pid),
            Err(e) => {
                warn!("[{}] run failed: {e}", metadata.display_name());
                e.run_code()
            }
        }
    })
}

/// Terminate `pid` under the process-wide supervisor.
///
/// Returns `status::STOP_OK` when the process is gone or its termination was
/// accepted, otherwise one of the other `status::STOP_*` codes.
pub fn stop(pid: i64) -> i64 {
    guard(status::STOP_INTERNAL_ERROR, || {
        match supervisor::global().stop(pid) {
            Ok(_) => status::STOP_OK,
            Err(e) => {
                warn!("stop failed: {e}");
                e.stop_code()
            }
        }
    })
}
