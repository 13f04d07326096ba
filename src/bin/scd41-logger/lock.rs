// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use log::{info, warn};

/// PID file preventing a second logger from driving the same sensor.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(pid) = holder(path)? {
            if process_alive(pid) {
                bail!("another instance is running: pid {pid} holds {}", path.display());
            }
            warn!("removing stale lock file {} of pid {pid}", path.display());
            fs::remove_file(path)
                .with_context(|| format!("failed to remove stale lock file {}", path.display()))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("failed to create lock file {}", path.display()))?;
        write!(file, "{}", std::process::id())
            .with_context(|| format!("failed to write lock file {}", path.display()))?;

        Ok(LockFile {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file; safe to call more than once.
    pub fn release(&self) {
        remove_lock(&self.path);
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.release();
    }
}

/// Removes the lock file at `path`, ignoring a file that is already gone.
pub fn remove_lock(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("lock file {} removed", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove lock file {}: {e}", path.display()),
    }
}

/// PID recorded in an existing lock file. An unreadable PID counts as stale.
fn holder(path: &Path) -> Result<Option<u32>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.trim().parse().unwrap_or(0))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read lock file {}", path.display())),
    }
}

fn process_alive(pid: u32) -> bool {
    pid != 0 && Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_lock(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("scd41-{name}-{}.lock", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn writes_pid_and_removes_on_drop() {
        let path = temp_lock("drop");
        {
            let _lock = LockFile::acquire(&path).unwrap();
            let pid = fs::read_to_string(&path).unwrap();
            assert_eq!(pid, std::process::id().to_string());
        }
        assert!(!path.exists());
    }

    #[test]
    fn refuses_live_holder() {
        let path = temp_lock("live");
        let _lock = LockFile::acquire(&path).unwrap();
        assert!(LockFile::acquire(&path).is_err());
    }

    #[test]
    fn removed_by_path_and_drop_tolerates_it() {
        let path = temp_lock("path");
        let lock = LockFile::acquire(&path).unwrap();
        remove_lock(lock.path());
        assert!(!path.exists());
        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn removed_when_holder_fails() {
        let path = temp_lock("error");
        let failing = || -> Result<()> {
            let _lock = LockFile::acquire(&path)?;
            bail!("self-test failed")
        };
        assert!(failing().is_err());
        assert!(!path.exists());
    }

    #[test]
    fn replaces_stale_lock() {
        let path = temp_lock("stale");
        fs::write(&path, "not-a-pid").unwrap();
        let lock = LockFile::acquire(&path).unwrap();
        lock.release();
        assert!(!path.exists());
    }
}
