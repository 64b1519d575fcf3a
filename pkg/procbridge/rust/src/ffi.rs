// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! C ABI interface for `run` and `stop`.
//!
//! Exports two symbols:
//! - `dd_procbridge_run` launches a process and returns its pid or a negative code.
//! - `dd_procbridge_stop` terminates a pid and returns a status code.
//!
//! All input strings are length-delimited (`dd_str`), not NUL-terminated, and
//! stay owned by the caller. Nothing is allocated for the caller, so there is
//! no free function. See `include/dd_procbridge.h`.

#![allow(non_camel_case_types)] // C ABI types use C naming conventions

use std::ffi::c_char;

use log::warn;

use crate::errors::{Error, Result};
use crate::metadata::ProcessMetadata;
use crate::status;

// ---------------------------------------------------------------------------
// #[repr(C)] types
// ---------------------------------------------------------------------------

/// Borrowed, length-delimited UTF-8 string.
/// NULL `data` with `len == 0` is the empty string.
#[repr(C)]
pub struct dd_str {
    pub data: *const c_char,
    pub len: usize,
}

/// Borrowed array of `dd_str`. NULL `data` with `len == 0` is empty.
#[repr(C)]
pub struct dd_strs {
    pub data: *const dd_str,
    pub len: usize,
}

#[repr(C)]
pub struct dd_process_metadata {
    pub name: dd_str,
    pub shell: dd_str,
    pub command: dd_str,
    pub log_path: dd_str,
    pub args: dd_strs,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl dd_str {
    /// Copy into an owned `String`.
    ///
    /// # Safety
    /// If `data` is non-NULL it must point to `len` readable bytes.
    unsafe fn to_owned_string(&self, field: &str) -> Result<String> {
        if self.data.is_null() {
            if self.len == 0 {
                return Ok(String::new());
            }
            return Err(Error::invalid(format!("{field}: NULL data with len {}", self.len)));
        }
        // SAFETY: caller guarantees `data` points to `len` readable bytes.
        let bytes = unsafe { std::slice::from_raw_parts(self.data.cast::<u8>(), self.len) };
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::invalid(format!("{field}: {e}")))
    }
}

impl dd_strs {
    /// # Safety
    /// If `data` is non-NULL it must point to `len` valid `dd_str`s, each
    /// satisfying [`dd_str::to_owned_string`]'s requirements.
    unsafe fn to_owned_vec(&self, field: &str) -> Result<Vec<String>> {
        if self.data.is_null() {
            if self.len == 0 {
                return Ok(Vec::new());
            }
            return Err(Error::invalid(format!("{field}: NULL data with len {}", self.len)));
        }
        // SAFETY: caller guarantees `data` points to `len` dd_str values.
        let items = unsafe { std::slice::from_raw_parts(self.data, self.len) };
        items
            .iter()
            .enumerate()
            // SAFETY: each element is valid per the caller's guarantee.
            .map(|(i, s)| unsafe { s.to_owned_string(&format!("{field}[{i}]")) })
            .collect()
    }
}

impl dd_process_metadata {
    /// # Safety
    /// Every string field must satisfy [`dd_str::to_owned_string`]'s requirements.
    unsafe fn to_metadata(&self) -> Result<ProcessMetadata> {
        // SAFETY: forwarded from the caller.
        unsafe {
            Ok(ProcessMetadata {
                name: self.name.to_owned_string("name")?,
                shell: self.shell.to_owned_string("shell")?,
                command: self.command.to_owned_string("command")?,
                log_path: self.log_path.to_owned_string("log_path")?,
                args: self.args.to_owned_vec("args")?,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Exported C ABI functions
// ---------------------------------------------------------------------------

/// Launch one process described by `metadata`.
///
/// # Returns
/// - `> 0`: pid of the spawned child
/// - `-1`: spawn failed
/// - `-2`: invalid metadata (NULL pointer, invalid UTF-8, empty or unresolvable shell)
/// - `-3`: log file could not be opened
/// - `-4`: internal error
///
/// # Safety
/// - `metadata` must be NULL or point to a valid `dd_process_metadata`.
/// - Every non-NULL `dd_str` in it must point to `len` readable bytes, and
///   `args.data` (if non-NULL) to `args.len` `dd_str` values.
/// - The memory only needs to stay valid for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn dd_procbridge_run(metadata: *const dd_process_metadata) -> i64 {
    crate::guard(status::RUN_INTERNAL_ERROR, || {
        // SAFETY: caller guarantees `metadata` is NULL or valid.
        let Some(raw) = (unsafe { metadata.as_ref() }) else {
            warn!("dd_procbridge_run called with NULL metadata");
            return status::RUN_INVALID_METADATA;
        };
        // SAFETY: caller guarantees the string fields are valid.
        match unsafe { raw.to_metadata() } {
            Ok(metadata) => crate::run(metadata),
            Err(e) => {
                warn!("dd_procbridge_run: {e}");
                e.run_code()
            }
        }
    })
}

/// Terminate `pid`.
///
/// # Returns
/// - `0`: terminated, already gone, or termination in progress
/// - `1`: no such process (including `pid <= 0`)
/// - `2`: permission denied
/// - `3`: termination failed
/// - `4`: internal error
#[unsafe(no_mangle)]
pub extern "C" fn dd_procbridge_stop(pid: i64) -> i64 {
    crate::stop(pid)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::undocumented_unsafe_blocks,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use std::ptr;

    fn dd(s: &str) -> dd_str {
        dd_str {
            data: s.as_ptr().cast::<c_char>(),
            len: s.len(),
        }
    }

    const EMPTY: dd_str = dd_str {
        data: ptr::null(),
        len: 0,
    };

    #[test]
    fn null_and_empty_strings() {
        assert_eq!(unsafe { EMPTY.to_owned_string("f") }.unwrap(), "");
        let bad = dd_str {
            data: ptr::null(),
            len: 3,
        };
        assert!(unsafe { bad.to_owned_string("f") }.is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let bytes = [0x66u8, 0xff, 0x6f];
        let s = dd_str {
            data: bytes.as_ptr().cast::<c_char>(),
            len: bytes.len(),
        };
        let err = unsafe { s.to_owned_string("command") }.unwrap_err();
        assert_eq!(err.run_code(), status::RUN_INVALID_METADATA);
        assert!(err.to_string().contains("command"));
    }

    #[test]
    fn metadata_conversion_keeps_arg_order() {
        let args = [dd("a"), dd("b b"), dd("c")];
        let raw = dd_process_metadata {
            name: dd("svc"),
            shell: dd("/bin/sh"),
            command: dd("echo"),
            log_path: dd("/tmp/svc.log"),
            args: dd_strs {
                data: args.as_ptr(),
                len: args.len(),
            },
        };
        let metadata = unsafe { raw.to_metadata() }.unwrap();
        assert_eq!(metadata.name, "svc");
        assert_eq!(metadata.shell, "/bin/sh");
        assert_eq!(metadata.command, "echo");
        assert_eq!(metadata.log_path, "/tmp/svc.log");
        assert_eq!(metadata.args, vec!["a", "b b", "c"]);
    }

    #[test]
    fn null_args_array_with_length_is_rejected() {
        let raw = dd_process_metadata {
            name: dd("svc"),
            shell: dd("/bin/sh"),
            command: dd("true"),
            log_path: dd("/tmp/svc.log"),
            args: dd_strs {
                data: ptr::null(),
                len: 2,
            },
        };
        assert!(unsafe { raw.to_metadata() }.is_err());
    }

    #[test]
    fn run_null_metadata() {
        assert_eq!(
            unsafe { dd_procbridge_run(ptr::null()) },
            status::RUN_INVALID_METADATA
        );
    }

    #[test]
    fn run_empty_shell() {
        let raw = dd_process_metadata {
            name: dd("svc"),
            shell: EMPTY,
            command: dd("true"),
            log_path: dd("/tmp/never-created.log"),
            args: dd_strs {
                data: ptr::null(),
                len: 0,
            },
        };
        assert_eq!(
            unsafe { dd_procbridge_run(&raw) },
            status::RUN_INVALID_METADATA
        );
    }

    #[test]
    fn stop_unknown_pid() {
        assert_eq!(dd_procbridge_stop(0), status::STOP_NOT_FOUND);
        assert_eq!(dd_procbridge_stop(-42), status::STOP_NOT_FOUND);
        assert_eq!(
            dd_procbridge_stop(i64::from(i32::MAX)),
            status::STOP_NOT_FOUND
        );
    }
}
