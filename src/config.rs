//! Runtime configuration loading.
//!
//! Reads `cmdhub.yaml` and resolves defaults field by field — an absent
//! file or absent field always has a working fallback, so the dispatcher
//! can start with zero configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::executor::PollPolicy;
use crate::providers::ProviderDescriptor;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {reason}")]
    Read {
        path: String,
        reason: String,
    },

    #[error("failed to parse config at {path}: {reason}")]
    Parse {
        path: String,
        reason: String,
    },
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Job-poll backoff settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_base_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_poll_step_ms")]
    pub step_ms: u64,
    #[serde(default = "default_poll_max_ms")]
    pub max_delay_ms: u64,
    /// Optional hard attempt budget. Absent = poll until terminal.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_poll_base_ms() -> u64 {
    500
}
fn default_poll_step_ms() -> u64 {
    200
}
fn default_poll_max_ms() -> u64 {
    5000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_poll_base_ms(),
            step_ms: default_poll_step_ms(),
            max_delay_ms: default_poll_max_ms(),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// The executor-facing poll policy.
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            base_delay: Duration::from_millis(self.base_delay_ms),
            step: Duration::from_millis(self.step_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_attempts: self.max_attempts,
        }
    }
}

/// Extra or overriding provider entries from config.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSeed {
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl ProviderSeed {
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            endpoint: self.endpoint.clone(),
            known_commands: self.commands.clone(),
        }
    }
}

/// Top-level dispatcher configuration (mirrors `cmdhub.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Provider that absorbs free-form input matching no rule. Absent =
    /// unmatched input is an error.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// A token is treated as expired this many seconds before its expiry.
    #[serde(default = "default_auth_buffer_secs")]
    pub auth_buffer_secs: i64,
    /// Identical-input suppression window.
    #[serde(default = "default_duplicate_window_ms")]
    pub duplicate_window_ms: u64,
    #[serde(default)]
    pub poll: PollConfig,
    /// Providers to register on top of the built-in table. Matching ids
    /// replace built-ins.
    #[serde(default)]
    pub providers: Vec<ProviderSeed>,
}

fn default_auth_buffer_secs() -> i64 {
    60
}
fn default_duplicate_window_ms() -> u64 {
    1000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            auth_buffer_secs: default_auth_buffer_secs(),
            duplicate_window_ms: default_duplicate_window_ms(),
            poll: PollConfig::default(),
            providers: Vec::new(),
        }
    }
}

impl DispatchConfig {
    pub fn duplicate_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_window_ms)
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate `cmdhub.yaml`.
///
/// 1. `CMDHUB_CONFIG` env var, when it points at an existing file.
/// 2. Upward search from `start` for `cmdhub.yaml`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("CMDHUB_CONFIG") {
        let candidate = PathBuf::from(explicit);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join("cmdhub.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

/// Load configuration from a YAML file.
pub fn load_config(path: &Path) -> Result<DispatchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load configuration if a file is found; defaults otherwise. Parse
/// failures are logged and fall back to defaults rather than aborting.
pub fn load_or_default(start: &Path) -> DispatchConfig {
    let Some(path) = find_config_path(start) else {
        tracing::debug!("no cmdhub.yaml found, using defaults");
        return DispatchConfig::default();
    };

    match load_config(&path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded configuration");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "config unusable, using defaults");
            DispatchConfig::default()
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
