use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

use crate::paths::Paths;
use crate::settings::Settings;
use crate::unit::{FileUnit, Hook, TrackedFile};

const HOSTS_FILE: &str = "/etc/hosts";

/// File units shipped with netprof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinUnit {
    Hosts,
    Resolv,
    Wifi,
    NetworkManager,
    Proxy,
}

impl BuiltinUnit {
    /// Get all built-in units, in processing order
    pub fn all() -> Vec<BuiltinUnit> {
        vec![
            BuiltinUnit::Hosts,
            BuiltinUnit::Resolv,
            BuiltinUnit::Wifi,
            BuiltinUnit::NetworkManager,
            BuiltinUnit::Proxy,
        ]
    }

    /// Storage directory name inside a profile
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinUnit::Hosts => "hosts",
            BuiltinUnit::Resolv => "resolv",
            BuiltinUnit::Wifi => "wifi",
            BuiltinUnit::NetworkManager => "network-manager",
            BuiltinUnit::Proxy => "proxy",
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            BuiltinUnit::Hosts => "Static host table",
            BuiltinUnit::Resolv => "DNS resolver",
            BuiltinUnit::Wifi => "WPA supplicant",
            BuiltinUnit::NetworkManager => "NetworkManager",
            BuiltinUnit::Proxy => "Command-line proxies",
        }
    }

    /// Live files tracked by this unit
    pub fn tracked_files(&self, paths: &Paths) -> Vec<TrackedFile> {
        match self {
            BuiltinUnit::Hosts => vec![TrackedFile::privileged(HOSTS_FILE)],
            BuiltinUnit::Resolv => vec![TrackedFile::privileged("/etc/resolv.conf")],
            BuiltinUnit::Wifi => vec![TrackedFile::privileged(
                "/etc/wpa_supplicant/wpa_supplicant.conf",
            )],
            BuiltinUnit::NetworkManager => vec![TrackedFile::privileged(
                "/etc/NetworkManager/NetworkManager.conf",
            )],
            BuiltinUnit::Proxy => vec![
                TrackedFile::new(paths.in_home(".curlrc")),
                TrackedFile::new(paths.in_home(".wgetrc")),
            ],
        }
    }

    /// Service restarted after this unit is loaded, if any
    pub fn service(&self) -> Option<&'static str> {
        match self {
            BuiltinUnit::Wifi => Some("wpa_supplicant"),
            BuiltinUnit::NetworkManager => Some("NetworkManager"),
            _ => None,
        }
    }

    /// Build the file unit with its hooks attached
    pub fn file_unit(&self, paths: &Paths, settings: &Settings) -> Result<FileUnit> {
        let mut unit = FileUnit::new(self.name(), self.tracked_files(paths))
            .with_context(|| format!("Invalid built-in unit '{}'", self.name()))?;

        if matches!(self, BuiltinUnit::Hosts) {
            unit = unit.with_empty_handler(RequireSource {
                path: PathBuf::from(HOSTS_FILE),
            });
        }
        if let Some(service) = self.service() {
            unit = unit.with_post_load(ServiceRestart::new(settings, service));
        }
        Ok(unit)
    }
}

impl FromStr for BuiltinUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hosts" => Ok(BuiltinUnit::Hosts),
            "resolv" => Ok(BuiltinUnit::Resolv),
            "wifi" => Ok(BuiltinUnit::Wifi),
            "network-manager" => Ok(BuiltinUnit::NetworkManager),
            "proxy" => Ok(BuiltinUnit::Proxy),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

/// Resolve a user selection into units, kept in catalog order.
///
/// `None` or an empty selection means every built-in unit.
pub fn select_units(names: Option<&[String]>) -> Result<Vec<BuiltinUnit>> {
    let Some(names) = names.filter(|n| !n.is_empty()) else {
        return Ok(BuiltinUnit::all());
    };

    let mut selected = Vec::new();
    for name in names {
        match name.parse::<BuiltinUnit>() {
            Ok(unit) => selected.push(unit),
            Err(_) => bail!(
                "Invalid unit name: '{}'\nHint: Valid units are {}",
                name,
                BuiltinUnit::all()
                    .iter()
                    .map(|u| u.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    Ok(BuiltinUnit::all()
        .into_iter()
        .filter(|u| selected.contains(u))
        .collect())
}

/// Post-load hook: `<sudo> <systemctl> restart <service>`
#[derive(Debug, Clone)]
pub struct ServiceRestart {
    sudo: String,
    systemctl: String,
    service: String,
}

impl ServiceRestart {
    pub fn new(settings: &Settings, service: impl Into<String>) -> Self {
        Self {
            sudo: settings.sudo.clone(),
            systemctl: settings.systemctl.clone(),
            service: service.into(),
        }
    }
}

impl Hook for ServiceRestart {
    fn run(&self) -> Result<()> {
        tracing::info!(service = %self.service, "restarting service");
        let status = Command::new(&self.sudo)
            .arg(&self.systemctl)
            .arg("restart")
            .arg(&self.service)
            .status()
            .with_context(|| format!("Failed to run '{} {}'", self.sudo, self.systemctl))?;

        if !status.success() {
            bail!(
                "Restarting '{}' exited with {}",
                self.service,
                status
            );
        }
        Ok(())
    }
}

/// Empty-source handler that refuses to save without the live file
#[derive(Debug, Clone)]
pub struct RequireSource {
    path: PathBuf,
}

impl Hook for RequireSource {
    fn run(&self) -> Result<()> {
        bail!("Required file {} is missing", self.path.display())
    }
}
