// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Integer codes returned across the bridge. These values are part of the
//! ABI and must not change within a release.
//!
//! `run` returns the child's pid (> 0) or one of the negative `RUN_*` codes.
//! `stop` returns [`STOP_OK`] or one of the positive `STOP_*` codes.

/// The OS rejected process creation (missing executable, permissions, limits).
pub const RUN_SPAWN_FAILED: i64 = -1;
/// Empty or unresolvable shell, or malformed input at the C boundary.
pub const RUN_INVALID_METADATA: i64 = -2;
/// The log file could not be created or opened for append.
pub const RUN_LOG_OPEN_FAILED: i64 = -3;
/// A panic was caught at the boundary.
pub const RUN_INTERNAL_ERROR: i64 = -4;

/// Terminated, already gone, or being terminated by a concurrent call.
pub const STOP_OK: i64 = 0;
/// No such process, or a pid outside `1..=i32::MAX`.
pub const STOP_NOT_FOUND: i64 = 1;
pub const STOP_PERMISSION_DENIED: i64 = 2;
/// Signal delivery failed, or the process survived forceful termination.
pub const STOP_TERMINATION_FAILED: i64 = 3;
/// A panic was caught at the boundary.
pub const STOP_INTERNAL_ERROR: i64 = 4;
