use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// State stored in ~/.netprof/state.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct State {
    /// The profile most recently restored to the live files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_loaded: Option<String>,

    /// The profile most recently snapshotted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,

    /// When the state was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl State {
    /// Read state from file, returning default if the file is missing or empty.
    ///
    /// An empty file is what [`LockedState`] leaves behind when the operation
    /// holding the lock fails before updating.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", path))
    }

    /// Write state to file atomically (temp file, then rename).
    ///
    /// Does not lock; commands go through [`LockedState`].
    #[cfg(test)]
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("Failed to write temp state file: {:?}", temp_path))?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename state file: {:?} -> {:?}", temp_path, path))
    }
}

/// A locked state file handle for safe concurrent access.
///
/// Holding the lock for the whole of a save or load keeps two netprof
/// processes from writing the same profile at once.
pub struct LockedState {
    file: File,
    state: State,
    path: std::path::PathBuf,
}

impl LockedState {
    /// Open and lock the state file for exclusive access
    pub fn lock(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open state file: {:?}", path))?;

        // Blocks while another netprof process holds it
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock state file: {:?}", path))?;

        let state = Self::read_from_file(&file, path)?;

        Ok(Self {
            file,
            state,
            path: path.to_path_buf(),
        })
    }

    fn read_from_file(mut file: &File, path: &Path) -> Result<State> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read state file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(State::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", path))
    }

    /// Get the current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Apply `f`, stamp `updated_at`, and write the state back in place
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut State),
    {
        f(&mut self.state);
        self.state.updated_at = Some(Utc::now());
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.state).context("Failed to serialize state")?;

        self.file
            .set_len(0)
            .with_context(|| format!("Failed to truncate state file: {:?}", self.path))?;
        self.file
            .seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to seek state file: {:?}", self.path))?;
        self.file
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;
        self.file
            .sync_all()
            .with_context(|| format!("Failed to sync state file: {:?}", self.path))?;

        Ok(())
    }
}

impl Drop for LockedState {
    fn drop(&mut self) {
        // Release the lock (ignore errors during drop)
        let _ = self.file.unlock();
    }
}
