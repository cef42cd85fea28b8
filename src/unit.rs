//! File units: the save/load engine.
//!
//! A [`FileUnit`] is a named, ordered group of [`TrackedFile`]s that are
//! snapshotted into and restored from profile storage together. Backups live at
//!
//! ```text
//! <location>/<profile>/<unit name>/<basename of tracked file>
//! ```
//!
//! Save always copies with the invoking user's privileges. Load restores with
//! the privileged copy path when a file asks for it, then runs the unit's
//! post-load hook once every file has been handled.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fs_utils::{Copier, exists};

/// Longest accepted unit or profile name
const MAX_NAME_LEN: usize = 64;

/// Errors produced while building or running a file unit
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("tracked path must be absolute and name a file: {}", .0.display())]
    InvalidTrackedPath(PathBuf),

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {} to {}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("privileged copy of {} to {} failed", src.display(), dst.display())]
    PrivilegedCopy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("empty-source handler for unit '{unit}' failed")]
    EmptySourceHook {
        unit: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("post-load hook for unit '{unit}' failed")]
    PostLoadHook {
        unit: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A zero-argument callback attached to a unit.
///
/// Closures returning `anyhow::Result<()>` implement this directly.
pub trait Hook: Send + Sync {
    fn run(&self) -> anyhow::Result<()>;
}

impl<F> Hook for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self) -> anyhow::Result<()> {
        self()
    }
}

/// One live file managed by a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// Absolute path of the live file
    pub path: PathBuf,
    /// Restore through the privileged copy path
    pub requires_privilege: bool,
}

impl TrackedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            requires_privilege: false,
        }
    }

    pub fn privileged(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            requires_privilege: true,
        }
    }

    /// Final path component, used as the backup file name
    fn leaf(&self) -> Result<&std::ffi::OsStr, UnitError> {
        self.path
            .file_name()
            .ok_or_else(|| UnitError::InvalidTrackedPath(self.path.clone()))
    }
}

/// A named group of tracked files saved and restored together
#[derive(Clone)]
pub struct FileUnit {
    name: String,
    files: Vec<TrackedFile>,
    on_empty_source: Option<Arc<dyn Hook>>,
    on_after_load: Option<Arc<dyn Hook>>,
}

impl fmt::Debug for FileUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUnit")
            .field("name", &self.name)
            .field("files", &self.files)
            .field("on_empty_source", &self.on_empty_source.is_some())
            .field("on_after_load", &self.on_after_load.is_some())
            .finish()
    }
}

impl FileUnit {
    /// Build a unit, validating its name and tracked paths
    pub fn new(name: impl Into<String>, files: Vec<TrackedFile>) -> Result<Self, UnitError> {
        let name = name.into();
        validate_name(&name)?;

        for file in &files {
            if !file.path.is_absolute() {
                return Err(UnitError::InvalidTrackedPath(file.path.clone()));
            }
            file.leaf()?;
        }

        Ok(Self {
            name,
            files,
            on_empty_source: None,
            on_after_load: None,
        })
    }

    /// Attach the handler run when a live file is missing during save
    pub fn with_empty_handler(mut self, hook: impl Hook + 'static) -> Self {
        self.on_empty_source = Some(Arc::new(hook));
        self
    }

    /// Attach the hook run once after a load has restored every file
    pub fn with_post_load(mut self, hook: impl Hook + 'static) -> Self {
        self.on_after_load = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[TrackedFile] {
        &self.files
    }

    pub(crate) fn has_empty_handler(&self) -> bool {
        self.on_empty_source.is_some()
    }

    pub(crate) fn has_post_load(&self) -> bool {
        self.on_after_load.is_some()
    }

    /// `<location>/<profile>/<name>`
    pub fn storage_dir(&self, location: &Path, profile: &str) -> PathBuf {
        location.join(profile).join(&self.name)
    }

    /// Where `file` is kept inside `profile`
    pub fn backup_path(
        &self,
        location: &Path,
        profile: &str,
        file: &TrackedFile,
    ) -> Result<PathBuf, UnitError> {
        Ok(self.storage_dir(location, profile).join(file.leaf()?))
    }

    /// Snapshot every live file into `<location>/<profile>/<name>/`.
    ///
    /// A missing live file is logged and handed to the empty-source handler;
    /// if the handler fails the remaining files are not attempted. Copies
    /// already made stay in place when a later step fails.
    pub fn save(
        &self,
        copier: &dyn Copier,
        profile: &str,
        location: &Path,
    ) -> Result<(), UnitError> {
        for file in &self.files {
            if !exists(&file.path) {
                warn!(unit = %self.name, "'{}' not found", file.path.display());
                if let Some(handler) = &self.on_empty_source {
                    debug!(unit = %self.name, "running empty-source handler");
                    handler.run().map_err(|source| UnitError::EmptySourceHook {
                        unit: self.name.clone(),
                        source,
                    })?;
                }
                continue;
            }

            let dir = self.storage_dir(location, profile);
            std::fs::create_dir_all(&dir).map_err(|source| UnitError::CreateDir {
                path: dir.clone(),
                source,
            })?;

            let dst = dir.join(file.leaf()?);
            copier
                .copy(&file.path, &dst)
                .map_err(|source| UnitError::Copy {
                    src: file.path.clone(),
                    dst: dst.clone(),
                    source,
                })?;
            info!(unit = %self.name, "save '{}' to '{}'", file.path.display(), dst.display());
        }
        Ok(())
    }

    /// Restore every backed-up file from `<location>/<profile>/<name>/`.
    ///
    /// Missing backups are skipped. The post-load hook runs exactly once,
    /// after all files, and only if no copy failed.
    pub fn load(
        &self,
        copier: &dyn Copier,
        profile: &str,
        location: &Path,
    ) -> Result<(), UnitError> {
        for file in &self.files {
            let src = self.backup_path(location, profile, file)?;
            debug!(unit = %self.name, "loading '{}' ...", src.display());
            if !exists(&src) {
                info!(unit = %self.name, "loading '{}' ... skip", src.display());
                continue;
            }

            if file.requires_privilege {
                copier
                    .copy_privileged(&src, &file.path)
                    .map_err(|source| UnitError::PrivilegedCopy {
                        src: src.clone(),
                        dst: file.path.clone(),
                        source,
                    })?;
            } else {
                copier
                    .copy(&src, &file.path)
                    .map_err(|source| UnitError::Copy {
                        src: src.clone(),
                        dst: file.path.clone(),
                        source,
                    })?;
            }
            info!(unit = %self.name, "loading '{}' to '{}'", src.display(), file.path.display());
        }

        if let Some(hook) = &self.on_after_load {
            debug!(unit = %self.name, "running post-load hook");
            hook.run().map_err(|source| UnitError::PostLoadHook {
                unit: self.name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Validate a unit or profile name.
///
/// Only allows alphanumeric characters, underscores, and hyphens, so the name
/// can be used verbatim as a directory.
pub fn validate_name(name: &str) -> Result<(), UnitError> {
    let invalid = |reason| UnitError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name cannot be longer than 64 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid(
            "only alphanumeric characters, hyphens (-), and underscores (_) are allowed",
        ));
    }
    Ok(())
}
