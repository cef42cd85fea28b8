use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the ~/.netprof base directory
pub const HOME_ENV: &str = "NETPROF_HOME";

/// All computed paths used by netprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// The user's home directory
    pub home_dir: PathBuf,
    /// ~/.netprof (or $NETPROF_HOME)
    pub base_dir: PathBuf,
    /// ~/.netprof/profiles, the storage root every profile lives under
    pub profiles_dir: PathBuf,
    /// ~/.netprof/state.json
    pub state_file: PathBuf,
    /// ~/.netprof/settings.json
    pub settings_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home_dir = base_dirs.home_dir().to_path_buf();

        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home_dir.join(".netprof"),
        };
        let profiles_dir = base_dir.join("profiles");
        let state_file = base_dir.join("state.json");
        let settings_file = base_dir.join("settings.json");

        Ok(Self {
            home_dir,
            base_dir,
            profiles_dir,
            state_file,
            settings_file,
        })
    }

    /// Store profiles under `location` instead of the default root
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.profiles_dir = location.into();
        self
    }

    /// The storage root passed to file units as `location`
    pub fn location(&self) -> &Path {
        &self.profiles_dir
    }

    /// Get the path to a specific profile directory
    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.profiles_dir.join(name)
    }

    /// Resolve a path relative to the home directory
    pub fn in_home(&self, relative: &str) -> PathBuf {
        self.home_dir.join(relative)
    }

    /// Ensure the base and storage directories exist.
    ///
    /// The base directory is created even with `--location`, since the state
    /// lock file always lives there.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).with_context(|| {
            format!("Failed to create base directory: {:?}", self.base_dir)
        })?;
        std::fs::create_dir_all(&self.profiles_dir).with_context(|| {
            format!(
                "Failed to create profiles directory: {:?}",
                self.profiles_dir
            )
        })?;
        Ok(())
    }
}
