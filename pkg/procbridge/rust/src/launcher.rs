// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::RunnerConfig;
use crate::errors::{Error, Result};
use crate::metadata::ProcessMetadata;
use crate::os;
use crate::table::SupervisedProcess;

/// Open `path` for append, creating it and any missing parent directories.
pub fn open_log(path: &Path) -> Result<File> {
    let log_err = |source| Error::LogOpen {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(log_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(log_err)
}

/// Validate `metadata`, open its log and spawn exactly one child with stdin
/// detached and stdout/stderr sharing the log file. Nothing is retried.
pub fn launch(metadata: &ProcessMetadata, runner: &RunnerConfig) -> Result<SupervisedProcess> {
    let name = metadata.display_name();
    let shell = metadata.resolve_shell()?;
    let log_path = metadata.resolve_log_path(runner);

    let stdout = open_log(&log_path)?;
    let stderr = stdout.try_clone().map_err(|source| Error::LogOpen {
        path: log_path.clone(),
        source,
    })?;

    let argv = metadata.argv(runner);
    debug!("[{name}] argv: {} {argv:?}", shell.display());

    let mut cmd = Command::new(&shell);
    cmd.args(&argv)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    // Dropping `cmd` on either path releases the parent's log descriptors.
    let child = cmd.spawn().map_err(|source| {
        warn!("[{name}] failed to spawn {}: {source}", shell.display());
        Error::Spawn {
            shell: metadata.shell.clone(),
            source,
        }
    })?;
    drop(cmd);

    let pid = child.id();
    info!(
        "[{name}] spawned (pid={pid}, cmd={}, log={})",
        metadata.shell,
        log_path.display()
    );
    Ok(SupervisedProcess::new(
        name.to_string(),
        log_path,
        child,
        os::start_token(pid),
    ))
}
