// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "/etc/datadog-agent/procbridge.yaml";
pub const CONFIG_PATH_ENV: &str = "DD_PROCBRIDGE_CONFIG";

fn default_true() -> bool {
    true
}

fn default_stop_timeout_ms() -> u64 {
    5_000
}

fn default_kill_timeout_ms() -> u64 {
    2_000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub stop: StopConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Command-introducer override keyed by shell basename (e.g. `bash: ["-lc"]`).
    #[serde(default)]
    pub shell_args: HashMap<String, Vec<String>>,
    /// Introducer for shells missing from both the override map and the built-in table.
    #[serde(default)]
    pub default_shell_args: Vec<String>,
    /// Base directory for relative `log_path` values.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    #[serde(default = "default_stop_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub escalate: bool,
    #[serde(default = "default_kill_timeout_ms")]
    pub kill_timeout_ms: u64,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_stop_timeout_ms(),
            escalate: true,
            kill_timeout_ms: default_kill_timeout_ms(),
        }
    }
}

impl StopConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }
}

pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Load from [`config_path`]. A missing file means defaults; a broken one
    /// is logged and also means defaults, since there is no caller to report to.
    pub fn from_env() -> Config {
        let path = config_path();
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Config::default();
        }
        match Config::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring config {}: {e:#}", path.display());
                Config::default()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("procbridge.yaml");
        let yaml = r#"
runner:
  shell_args:
    bash: ["-lc"]
  default_shell_args: ["--run"]
  log_dir: /var/log/procs
stop:
  timeout_ms: 250
  escalate: false
  kill_timeout_ms: 100
"#;
        fs::write(&path, yaml).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.runner.shell_args["bash"], vec!["-lc"]);
        assert_eq!(cfg.runner.default_shell_args, vec!["--run"]);
        assert_eq!(cfg.runner.log_dir.as_deref(), Some(Path::new("/var/log/procs")));
        assert_eq!(cfg.stop.grace_period(), Duration::from_millis(250));
        assert!(!cfg.stop.escalate);
        assert_eq!(cfg.stop.kill_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.yaml");
        fs::write(&path, "stop:\n  timeout_ms: 10\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.stop.timeout_ms, 10);
        assert!(cfg.stop.escalate);
        assert_eq!(cfg.stop.kill_timeout_ms, 2_000);
        assert!(cfg.runner.shell_args.is_empty());
        assert!(cfg.runner.log_dir.is_none());
    }

    #[test]
    fn test_empty_document_is_default() {
        let cfg: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.stop.timeout_ms, 5_000);
        assert!(cfg.runner.default_shell_args.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/procbridge.yaml")).is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "stop: [").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_from_env_reads_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "stop:\n  escalate: false\n").unwrap();

        let cfg = temp_env::with_var(CONFIG_PATH_ENV, Some(&path), Config::from_env);
        assert!(!cfg.stop.escalate);
    }

    #[test]
    fn test_from_env_falls_back_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "runner: 12\n").unwrap();

        let cfg = temp_env::with_var(CONFIG_PATH_ENV, Some(&bad), Config::from_env);
        assert_eq!(cfg.stop.timeout_ms, 5_000);

        let missing = dir.path().join("missing.yaml");
        let cfg = temp_env::with_var(CONFIG_PATH_ENV, Some(&missing), Config::from_env);
        assert!(cfg.stop.escalate);
    }
}
