//! Advisory single-instance lock.
//!
//! The web and watch front-ends take a per-scope lock under `.tend/` so two
//! instances never drive the same working tree. The lock is a JSON pid file;
//! a lock whose owner is no longer alive is treated as stale and replaced.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TendError};
use crate::io;
use crate::paths;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockFile {
    pid: u32,
    timestamp: DateTime<Utc>,
    label: String,
}

/// A held lock. Dropping the guard removes the lock file, but only if it
/// still belongs to this process (a forced takeover must not be undone).
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    pid: u32,
}

impl LockGuard {
    pub fn release(self) {
        // Drop does the work.
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let ours = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|data| serde_json::from_str::<LockFile>(&data).ok())
            .map(|lock| lock.pid == self.pid)
            .unwrap_or(false);
        if ours {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Acquire the `scope` lock for the repository at `root`.
///
/// `force` discards any existing lock. Otherwise an existing lock held by a
/// live process fails with [`TendError::AlreadyRunning`]; stale or corrupt
/// lock files are silently replaced.
pub fn acquire(root: &Path, scope: &str, label: &str, force: bool) -> Result<LockGuard> {
    let path = paths::lock_path(root, scope);

    if path.exists() {
        if force {
            std::fs::remove_file(&path)?;
        } else {
            match std::fs::read_to_string(&path)
                .ok()
                .and_then(|data| serde_json::from_str::<LockFile>(&data).ok())
            {
                Some(existing) if pid_alive(existing.pid) => {
                    return Err(TendError::AlreadyRunning {
                        scope: scope.to_string(),
                        pid: existing.pid,
                    });
                }
                // dead owner or unreadable file
                _ => std::fs::remove_file(&path)?,
            }
        }
    }

    let lock = LockFile {
        pid: std::process::id(),
        timestamp: Utc::now(),
        label: label.to_string(),
    };
    io::atomic_write(&path, serde_json::to_string_pretty(&lock)?.as_bytes())?;

    Ok(LockGuard {
        path,
        pid: lock.pid,
    })
}

#[cfg(unix)]
fn pid_alive(pid: u32) -> bool {
    // Signal 0 performs the permission/existence check without delivering.
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_alive(_pid: u32) -> bool {
    // No cheap liveness probe: assume live and let --force override.
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_writes_and_drop_removes() {
        let dir = TempDir::new().unwrap();
        let guard = acquire(dir.path(), "web", "tend web", false).unwrap();
        assert!(paths::lock_path(dir.path(), "web").exists());
        drop(guard);
        assert!(!paths::lock_path(dir.path(), "web").exists());
    }

    #[test]
    fn second_acquire_same_process_conflicts() {
        let dir = TempDir::new().unwrap();
        let _guard = acquire(dir.path(), "web", "tend web", false).unwrap();
        // Our own pid is alive, so this must report the conflict.
        match acquire(dir.path(), "web", "tend web", false) {
            Err(TendError::AlreadyRunning { scope, pid }) => {
                assert_eq!(scope, "web");
                assert_eq!(pid, std::process::id());
            }
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
    }

    #[test]
    fn force_replaces_existing_lock() {
        let dir = TempDir::new().unwrap();
        let _first = acquire(dir.path(), "web", "tend web", false).unwrap();
        let second = acquire(dir.path(), "web", "tend web", true).unwrap();
        assert!(paths::lock_path(dir.path(), "web").exists());
        drop(second);
        assert!(!paths::lock_path(dir.path(), "web").exists());
    }

    #[test]
    fn stale_lock_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = paths::lock_path(dir.path(), "web");
        let stale = LockFile {
            pid: u32::MAX - 1, // effectively guaranteed dead
            timestamp: Utc::now(),
            label: "old".to_string(),
        };
        io::atomic_write(&path, serde_json::to_string(&stale).unwrap().as_bytes()).unwrap();

        let guard = acquire(dir.path(), "web", "tend web", false).unwrap();
        drop(guard);
    }

    #[test]
    fn corrupt_lock_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = paths::lock_path(dir.path(), "web");
        io::atomic_write(&path, b"{not json").unwrap();
        acquire(dir.path(), "web", "tend web", false).unwrap();
    }

    #[test]
    fn different_scopes_do_not_conflict() {
        let dir = TempDir::new().unwrap();
        let _web = acquire(dir.path(), "web", "tend web", false).unwrap();
        let _watch = acquire(dir.path(), "watch", "tend watch", false).unwrap();
    }
}
