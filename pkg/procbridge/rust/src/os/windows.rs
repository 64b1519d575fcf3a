// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Windows has no graceful signal for arbitrary processes, so both
//! termination steps use `TerminateProcess`.

use windows_sys::Win32::Foundation::{
    CloseHandle, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, GetLastError, HANDLE, STILL_ACTIVE,
};
use windows_sys::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
    TerminateProcess,
};

use super::SignalError;

const TERMINATED_EXIT_CODE: u32 = 1;

fn last_error() -> SignalError {
    // SAFETY: GetLastError only reads thread-local state.
    match unsafe { GetLastError() } {
        ERROR_INVALID_PARAMETER => SignalError::NoSuchProcess,
        ERROR_ACCESS_DENIED => SignalError::PermissionDenied,
        code => SignalError::Other(format!("win32 error {code}")),
    }
}

struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(pid: i32, access: u32) -> Result<Self, SignalError> {
        let pid = u32::try_from(pid).map_err(|_| SignalError::NoSuchProcess)?;
        // SAFETY: OpenProcess has no pointer arguments; a null return signals failure.
        let handle = unsafe { OpenProcess(access, 0, pid) };
        if handle.is_null() {
            return Err(last_error());
        }
        Ok(Self(handle))
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: the handle came from a successful OpenProcess and is closed once.
        unsafe { CloseHandle(self.0) };
    }
}

fn terminate(pid: i32) -> Result<(), SignalError> {
    let process = ProcessHandle::open(pid, PROCESS_TERMINATE)?;
    // SAFETY: `process` holds a valid handle with PROCESS_TERMINATE access.
    if unsafe { TerminateProcess(process.0, TERMINATED_EXIT_CODE) } == 0 {
        return Err(last_error());
    }
    Ok(())
}

pub fn request_termination(pid: i32) -> Result<(), SignalError> {
    terminate(pid)
}

pub fn force_kill(pid: i32) -> Result<(), SignalError> {
    terminate(pid)
}

pub fn is_alive(pid: i32) -> bool {
    let process = match ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION) {
        Ok(p) => p,
        Err(SignalError::PermissionDenied) => return true,
        Err(_) => return false,
    };
    let mut code: u32 = 0;
    // SAFETY: valid handle with query access; `code` outlives the call.
    if unsafe { GetExitCodeProcess(process.0, &mut code) } == 0 {
        return false;
    }
    code == STILL_ACTIVE as u32
}

/// Not captured on Windows. Tracked children keep their process object open
/// through the `Child` handle, which already prevents pid reuse.
pub fn start_token(_pid: u32) -> Option<u64> {
    None
}
