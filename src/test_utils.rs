//! Test utilities shared across test modules
//!
//! Fixture paths, a recording copier and a counting hook, so the unit engine
//! can be exercised without invoking a real privilege-escalation helper.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use crate::fs_utils::Copier;
use crate::paths::Paths;
use crate::unit::Hook;

/// Create a Paths struct for testing using a temporary directory
///
/// Mirrors the real ~/.netprof layout, with the home directory inside the
/// temp directory as well.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    let base_dir = temp_dir.path().join(".netprof");
    Paths {
        home_dir: temp_dir.path().to_path_buf(),
        profiles_dir: base_dir.join("profiles"),
        state_file: base_dir.join("state.json"),
        settings_file: base_dir.join("settings.json"),
        base_dir,
    }
}

/// One copy request seen by [`RecordingCopier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Plain(PathBuf, PathBuf),
    Privileged(PathBuf, PathBuf),
}

/// Copier that records every call and performs it with `std::fs::copy`.
///
/// Calls whose source matches a path passed to [`RecordingCopier::fail_on`]
/// are recorded and then fail without touching the destination.
#[derive(Debug, Default)]
pub struct RecordingCopier {
    calls: Mutex<Vec<Call>>,
    fail_sources: Vec<PathBuf>,
}

impl RecordingCopier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, src: impl AsRef<Path>) -> Self {
        self.fail_sources.push(src.as_ref().to_path_buf());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn plain_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Plain(..)))
            .count()
    }

    pub fn privileged_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Privileged(..)))
            .count()
    }

    fn perform(&self, call: Call, src: &Path, dst: &Path) -> io::Result<u64> {
        self.calls.lock().unwrap().push(call);
        if self.fail_sources.iter().any(|p| p == src) {
            return Err(io::Error::other(format!("injected failure for {}", src.display())));
        }
        fs::copy(src, dst)
    }
}

impl Copier for RecordingCopier {
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        self.perform(Call::Plain(src.to_path_buf(), dst.to_path_buf()), src, dst)
    }

    fn copy_privileged(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.perform(Call::Privileged(src.to_path_buf(), dst.to_path_buf()), src, dst)
            .map(|_| ())
    }
}

/// Hook that counts its invocations and optionally fails
#[derive(Debug, Clone, Default)]
pub struct CountingHook {
    count: Arc<AtomicUsize>,
    failure: Option<&'static str>,
}

impl CountingHook {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing(message: &'static str) -> Self {
        Self {
            count: Arc::default(),
            failure: Some(message),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Hook for CountingHook {
    fn run(&self) -> anyhow::Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(message) => anyhow::bail!(message),
            None => Ok(()),
        }
    }
}
