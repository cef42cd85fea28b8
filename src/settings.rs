//! Runtime settings.
//!
//! Read from `~/.netprof/settings.json` when present, then overridden by
//! `NETPROF_SUDO` and `NETPROF_SYSTEMCTL`. Every field is optional in the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SUDO_ENV: &str = "NETPROF_SUDO";
pub const SYSTEMCTL_ENV: &str = "NETPROF_SYSTEMCTL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Program used to run privileged copies and service restarts
    pub sudo: String,
    /// Service manager invoked by post-load hooks
    pub systemctl: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sudo: "sudo".to_string(),
            systemctl: "systemctl".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from file, returning defaults if the file doesn't exist
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))
    }

    /// Read settings from file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::read(path)?;
        if let Some(sudo) = env_override(SUDO_ENV) {
            settings.sudo = sudo;
        }
        if let Some(systemctl) = env_override(SYSTEMCTL_ENV) {
            settings.systemctl = systemctl;
        }
        Ok(settings)
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
