//! Filesystem utility functions
//!
//! The existence check and copy capability the unit engine is built on. The
//! privileged path shells out to an escalation helper (`sudo` by default), so
//! the engine only ever sees its success or failure.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

/// Whether anything exists at `path` (symlinks are followed)
pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Plain and privileged file copies.
///
/// Both variants create or overwrite `dst` and preserve content exactly.
pub trait Copier {
    /// Copy as the invoking user, returning the number of bytes copied
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<u64>;

    /// Copy through the privilege-escalation helper
    fn copy_privileged(&self, src: &Path, dst: &Path) -> io::Result<()>;
}

/// Copier backed by `std::fs` and an external escalation program
#[derive(Debug, Clone)]
pub struct SystemCopier {
    sudo: String,
}

impl SystemCopier {
    pub fn new(sudo: impl Into<String>) -> Self {
        Self { sudo: sudo.into() }
    }
}

impl Default for SystemCopier {
    fn default() -> Self {
        Self::new("sudo")
    }
}

impl Copier for SystemCopier {
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<u64> {
        fs::copy(src, dst)
    }

    fn copy_privileged(&self, src: &Path, dst: &Path) -> io::Result<()> {
        let status = Command::new(&self.sudo)
            .arg("cp")
            .arg("--")
            .arg(src)
            .arg(dst)
            .status()
            .map_err(|e| {
                io::Error::new(e.kind(), format!("failed to run '{} cp': {}", self.sudo, e))
            })?;

        if !status.success() {
            return Err(io::Error::other(format!(
                "'{} cp' exited with {}",
                self.sudo, status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exists() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.conf");
        assert!(!exists(&file));
        fs::write(&file, "x").unwrap();
        assert!(exists(&file));
        assert!(exists(temp.path()));
    }

    #[test]
    fn test_plain_copy_overwrites() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old content that is longer").unwrap();

        let copied = SystemCopier::default().copy(&src, &dst).unwrap();
        assert_eq!(copied, 3);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_plain_copy_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = SystemCopier::default()
            .copy(&temp.path().join("nope"), &temp.path().join("dst"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_privileged_copy_via_helper() {
        // `env` runs the remaining arguments as a command, standing in for sudo
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::write(&src, "nameserver 9.9.9.9").unwrap();

        SystemCopier::new("env").copy_privileged(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "nameserver 9.9.9.9");
    }

    #[test]
    fn test_privileged_copy_helper_failure() {
        let temp = TempDir::new().unwrap();
        let copier = SystemCopier::new("false");
        let err = copier
            .copy_privileged(&temp.path().join("src"), &temp.path().join("dst"))
            .unwrap_err();
        assert!(err.to_string().contains("'false cp' exited with"));
    }

    #[test]
    fn test_privileged_copy_missing_helper() {
        let temp = TempDir::new().unwrap();
        let copier = SystemCopier::new("netprof-no-such-helper");
        let err = copier
            .copy_privileged(&temp.path().join("src"), &temp.path().join("dst"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
