// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::RunnerConfig;
use crate::errors::{Error, Result};

/// Flag each known interpreter expects before an inline command body.
static COMMAND_INTRODUCERS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "sh" => &["-c"],
    "bash" => &["-c"],
    "dash" => &["-c"],
    "zsh" => &["-c"],
    "ksh" => &["-c"],
    "mksh" => &["-c"],
    "ash" => &["-c"],
    "fish" => &["-c"],
    "csh" => &["-c"],
    "tcsh" => &["-c"],
    "python" => &["-c"],
    "python3" => &["-c"],
    "cmd" => &["/C"],
    "powershell" => &["-Command"],
    "pwsh" => &["-Command"],
    "node" => &["-e"],
    "perl" => &["-e"],
    "ruby" => &["-e"],
};

/// What to run. Built by the caller; carries no identity until `run` assigns
/// the OS pid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMetadata {
    pub name: String,
    pub shell: String,
    pub command: String,
    pub log_path: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProcessMetadata {
    /// Check the shell and resolve it to an executable path.
    pub fn resolve_shell(&self) -> Result<PathBuf> {
        let shell = self.shell.trim();
        if shell.is_empty() {
            return Err(Error::invalid("shell is empty"));
        }
        which::which(shell).map_err(|e| Error::invalid(format!("shell {shell:?} not found: {e}")))
    }

    /// Build the argument vector passed to the shell:
    /// `[introducer..., command, args...]`, preserving the caller's order.
    pub fn argv(&self, runner: &RunnerConfig) -> Vec<String> {
        let mut argv = command_introducer(&self.shell, runner);
        argv.push(self.command.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Where the combined output goes. Relative paths land under
    /// `runner.log_dir` when one is configured.
    pub fn resolve_log_path(&self, runner: &RunnerConfig) -> PathBuf {
        let path = Path::new(&self.log_path);
        match runner.log_dir {
            Some(ref dir) if path.is_relative() && !self.log_path.is_empty() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Label used in log lines; falls back to the shell when no name was given.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.shell
        } else {
            &self.name
        }
    }
}

fn shell_key(shell: &str) -> String {
    let base = shell
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(shell)
        .to_ascii_lowercase();
    match base.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => base,
    }
}

/// Flags inserted between the shell and the command. Configured overrides win
/// over the built-in table; unknown shells get `default_shell_args`.
pub fn command_introducer(shell: &str, runner: &RunnerConfig) -> Vec<String> {
    let key = shell_key(shell.trim());
    if let Some(args) = runner.shell_args.get(&key) {
        return args.clone();
    }
    match COMMAND_INTRODUCERS.get(key.as_str()) {
        Some(flags) => flags.iter().map(|f| f.to_string()).collect(),
        None => runner.default_shell_args.clone(),
    }
}
