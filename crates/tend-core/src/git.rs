//! Subprocess wrapper around the `git` binary.
//!
//! Every operation shells out; nothing links libgit2. Read operations that
//! feed the watch loop fail open (no changes / zero size / empty list) so a
//! transient git error can never crash a tick. Mutating operations return
//! typed errors carrying the git stderr.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use crate::error::{Result, TendError};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub committed: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOutcome {
    pub already_existed: bool,
}

// ---------------------------------------------------------------------------
// VersionControl: the interface the watch engine consumes
// ---------------------------------------------------------------------------

/// The slice of git the watch engine needs. [`Git`] is the real
/// implementation; tests drive the engine with a scripted double.
pub trait VersionControl {
    /// Whether the working tree or index differs from HEAD.
    /// Fails open to `false` on any git error.
    fn has_changes(&self) -> bool;

    /// Total added+deleted lines across unstaged and staged diffs.
    /// Fails open to `0` on any git error.
    fn change_size(&self) -> u64;

    /// Diff text used to seed AI commit messages: staged diff, falling back
    /// to the unstaged diff when nothing is staged yet.
    fn diff_text(&self) -> Result<String>;

    /// Stage everything, then commit. `committed: false` when staging
    /// produced an empty index (e.g. only ignored files changed).
    fn commit(&self, message: &str) -> Result<CommitOutcome>;

    /// Push `branch`, creating the upstream if absent.
    fn push(&self, branch: &str) -> PushOutcome;

    fn current_branch(&self) -> Result<String>;

    /// Commits on the current branch not on its upstream; `0` when no
    /// upstream is configured.
    fn unpushed_count(&self) -> u64;

    /// One-line summaries of the unpushed commits, newest first.
    fn unpushed_commits(&self) -> Vec<String>;

    /// `<short-hash> <subject>` lines for the last `n` commits.
    fn recent_commits(&self, n: u64) -> Result<String>;

    /// Paths changed in the index and working tree (for sensitive-file
    /// screening). Empty on error.
    fn changed_files(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| TendError::Git {
                command: args.join(" "),
                detail: format!("failed to spawn git: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail: String = stderr.trim().chars().take(500).collect();
            return Err(TendError::Git {
                command: args.join(" "),
                detail: if detail.is_empty() {
                    format!("exited with status {}", output.status)
                } else {
                    detail
                },
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run `git diff --quiet`-style commands: exit 0 means "no differences",
    /// exit 1 means "differences". Anything else is a real error.
    fn diff_quiet(&self, args: &[&str]) -> Result<bool> {
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| TendError::Git {
                command: args.join(" "),
                detail: format!("failed to spawn git: {e}"),
            })?;
        match status.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(TendError::Git {
                command: args.join(" "),
                detail: String::from_utf8_lossy(&status.stderr).trim().to_string(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Repository lifecycle
    // -----------------------------------------------------------------------

    pub fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"]).is_ok()
    }

    pub fn ensure_repo(&self) -> Result<()> {
        if self.is_repo() {
            Ok(())
        } else {
            Err(TendError::NotARepository)
        }
    }

    /// Initialize a repository with an initial commit on `default_branch`.
    /// A README is seeded when missing so the initial commit is never empty.
    pub fn init_repo(&self, default_branch: &str) -> Result<InitOutcome> {
        if self.is_repo() {
            return Ok(InitOutcome {
                already_existed: true,
            });
        }

        self.run(&["init"])?;

        let readme = self.root.join("README.md");
        if !readme.exists() {
            std::fs::write(&readme, "# Project\n")?;
        }

        self.run(&["add", "-A"])?;
        self.run(&["commit", "-m", "chore(init): initial commit"])?;
        self.run(&["branch", "-M", default_branch])?;

        Ok(InitOutcome {
            already_existed: false,
        })
    }

    pub fn repo_path(&self) -> Result<String> {
        self.run(&["rev-parse", "--show-toplevel"])
    }

    pub fn repo_name(&self) -> Result<String> {
        let path = self.repo_path()?;
        Ok(path
            .rsplit('/')
            .next()
            .unwrap_or(path.as_str())
            .to_string())
    }

    // -----------------------------------------------------------------------
    // Branches and history
    // -----------------------------------------------------------------------

    pub fn create_branch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-b", name])?;
        Ok(())
    }

    /// Switch to a branch or ref. `prev` steps back one commit; `next`
    /// returns to the previously checked-out ref.
    pub fn switch_branch(&self, reference: &str) -> Result<()> {
        match reference {
            "prev" => self.run(&["checkout", "HEAD~1"])?,
            "next" => self.run(&["checkout", "@{-1}"])?,
            other => self.run(&["checkout", other])?,
        };
        Ok(())
    }

    /// Local and remote branch names, deduplicated of the `remotes/origin/`
    /// prefix and symbolic entries.
    pub fn branches(&self) -> Result<Vec<String>> {
        let out = self.run(&["branch", "-a"])?;
        Ok(out
            .lines()
            .map(|b| b.trim().trim_start_matches("* ").to_string())
            .filter(|b| !b.is_empty() && !b.contains("->"))
            .map(|b| {
                b.strip_prefix("remotes/origin/")
                    .map(|s| s.to_string())
                    .unwrap_or(b)
            })
            .collect())
    }

    pub fn log_oneline(&self, count: usize) -> Result<String> {
        let n = format!("-n{count}");
        self.run(&["log", "--oneline", "--graph", "--decorate", &n])
    }

    pub fn last_commit(&self) -> Option<String> {
        self.run(&["log", "-1", "--format=%h - %s"]).ok()
    }

    /// `(ahead, behind)` relative to the upstream, `None` without one.
    pub fn ahead_behind(&self) -> Option<(u64, u64)> {
        self.run(&["rev-parse", "@{u}"]).ok()?;
        let ahead = self.run(&["rev-list", "--count", "@{u}..HEAD"]).ok()?;
        let behind = self.run(&["rev-list", "--count", "HEAD..@{u}"]).ok()?;
        Some((ahead.parse().ok()?, behind.parse().ok()?))
    }

    pub fn pull_rebase(&self) -> Result<()> {
        self.run(&["pull", "--rebase"])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Remotes
    // -----------------------------------------------------------------------

    pub fn remote_url(&self) -> Option<String> {
        self.run(&["remote", "get-url", "origin"]).ok()
    }

    pub fn set_remote_url(&self, url: &str) -> Result<()> {
        if self.remote_url().is_some() {
            self.run(&["remote", "set-url", "origin", url])?;
        } else {
            self.run(&["remote", "add", "origin", url])?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Working tree inspection
    // -----------------------------------------------------------------------

    /// `(modified, untracked)` file counts for status displays.
    pub fn change_counts(&self) -> (usize, usize) {
        let modified = self
            .run(&["diff", "--name-only"])
            .map(|s| s.lines().filter(|l| !l.is_empty()).count())
            .unwrap_or(0);
        let untracked = self
            .run(&["ls-files", "--others", "--exclude-standard"])
            .map(|s| s.lines().filter(|l| !l.is_empty()).count())
            .unwrap_or(0);
        (modified, untracked)
    }
}

fn numstat_total(numstat: &str) -> u64 {
    numstat
        .lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let added = cols.next()?.parse::<u64>().unwrap_or(0);
            let deleted = cols.next()?.parse::<u64>().unwrap_or(0);
            Some(added + deleted)
        })
        .sum()
}

impl VersionControl for Git {
    fn has_changes(&self) -> bool {
        let unstaged = self.diff_quiet(&["diff", "--quiet"]);
        let staged = self.diff_quiet(&["diff", "--cached", "--quiet"]);
        match (unstaged, staged) {
            (Ok(a), Ok(b)) => a || b,
            // fail open: a broken git invocation reads as "nothing to do"
            _ => false,
        }
    }

    fn change_size(&self) -> u64 {
        let unstaged = self.run(&["diff", "--numstat"]).unwrap_or_default();
        let staged = self
            .run(&["diff", "--cached", "--numstat"])
            .unwrap_or_default();
        numstat_total(&unstaged) + numstat_total(&staged)
    }

    fn diff_text(&self) -> Result<String> {
        let staged = self.run(&["diff", "--cached"])?;
        if !staged.trim().is_empty() {
            return Ok(staged);
        }
        self.run(&["diff"])
    }

    fn commit(&self, message: &str) -> Result<CommitOutcome> {
        self.run(&["add", "-A"])?;

        // Staging everything can still leave an empty index (only ignored
        // files changed); committing then would create an empty commit.
        if !self.diff_quiet(&["diff", "--cached", "--quiet"])? {
            return Ok(CommitOutcome {
                committed: false,
                message: "No changes to commit".to_string(),
            });
        }

        self.run(&["commit", "-m", message])?;
        Ok(CommitOutcome {
            committed: true,
            message: message.to_string(),
        })
    }

    fn push(&self, branch: &str) -> PushOutcome {
        match self.run(&["push", "-u", "origin", branch]) {
            Ok(_) => PushOutcome {
                success: true,
                error: None,
            },
            Err(e) => PushOutcome {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }

    fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn unpushed_count(&self) -> u64 {
        if self.run(&["rev-parse", "@{u}"]).is_err() {
            return 0;
        }
        self.run(&["rev-list", "--count", "@{u}..HEAD"])
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    fn unpushed_commits(&self) -> Vec<String> {
        if self.run(&["rev-parse", "@{u}"]).is_err() {
            return Vec::new();
        }
        self.run(&["log", "--oneline", "@{u}..HEAD"])
            .map(|out| {
                out.lines()
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn recent_commits(&self, n: u64) -> Result<String> {
        let count = format!("-{n}");
        self.run(&["log", &count, "--format=%h %s"])
    }

    fn changed_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for args in [
            &["diff", "--name-only"][..],
            &["diff", "--cached", "--name-only"][..],
        ] {
            if let Ok(out) = self.run(args) {
                files.extend(out.lines().filter(|l| !l.is_empty()).map(String::from));
            }
        }
        files.sort();
        files.dedup();
        files
    }
}

// ---------------------------------------------------------------------------
// Sensitive-file screening
// ---------------------------------------------------------------------------

const SENSITIVE_PATTERNS: &[&str] = &[
    ".env",
    "credentials",
    "secrets",
    "password",
    "private",
    ".pem",
    ".key",
];

/// Warnings for paths that look like they carry secrets. Attached to commit
/// confirmation requests so the operator sees them before approving.
pub fn sensitive_file_warnings(files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter(|file| {
            let lower = file.to_lowercase();
            SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .map(|file| format!("Sensitive file detected: {file}"))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
