//! GitHub CLI (`gh`) integration: presence/auth checks and repo creation.
//!
//! tend never speaks the GitHub API itself; everything goes through `gh`,
//! which owns credentials and token refresh.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, TendError};

// ---------------------------------------------------------------------------
// Presence / auth
// ---------------------------------------------------------------------------

pub fn is_gh_installed() -> bool {
    which::which("gh").is_ok()
}

pub fn is_gh_authenticated() -> bool {
    let Ok(output) = Command::new("gh").args(["auth", "status"]).output() else {
        return false;
    };
    // gh historically printed auth status on stderr; accept either stream.
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output.status.success() && text.contains("Logged in")
}

/// Fail with an actionable error unless `gh` is installed and authenticated.
pub fn ensure_gh_ready() -> Result<()> {
    if !is_gh_installed() {
        return Err(TendError::GhMissing(install_hint().to_string()));
    }
    if !is_gh_authenticated() {
        return Err(TendError::GhNotAuthenticated);
    }
    Ok(())
}

pub fn install_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install gh"
    } else if cfg!(target_os = "windows") {
        "Install with: winget install --id GitHub.cli"
    } else {
        "Install via your package manager, e.g. 'sudo apt install gh' — see https://cli.github.com/"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhStatus {
    pub installed: bool,
    pub authenticated: bool,
}

pub fn gh_status() -> GhStatus {
    let installed = is_gh_installed();
    GhStatus {
        installed,
        authenticated: installed && is_gh_authenticated(),
    }
}

// ---------------------------------------------------------------------------
// Repository creation
// ---------------------------------------------------------------------------

/// Create a GitHub repository for the project at `root` and wire it up as
/// `origin`. When `push` is set the current branch is pushed immediately.
pub fn create_repo(
    root: &Path,
    name: &str,
    description: Option<&str>,
    private: bool,
    push: bool,
) -> Result<()> {
    ensure_gh_ready()?;

    let mut cmd = Command::new("gh");
    cmd.current_dir(root)
        .args(["repo", "create", name])
        .arg(if private { "--private" } else { "--public" })
        .args(["--source", ".", "--remote", "origin"]);
    if let Some(desc) = description {
        if !desc.trim().is_empty() {
            cmd.args(["--description", desc]);
        }
    }
    if push {
        cmd.arg("--push");
    }

    let output = cmd.output().map_err(|e| TendError::Git {
        command: "gh repo create".to_string(),
        detail: format!("failed to spawn gh: {e}"),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TendError::Git {
            command: "gh repo create".to_string(),
            detail: stderr.trim().chars().take(500).collect(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Remote URL utilities
// ---------------------------------------------------------------------------

/// Normalize a git remote to a browsable https URL.
/// `git@github.com:user/repo.git` → `https://github.com/user/repo`.
pub fn remote_to_https(remote_url: &str) -> String {
    if let Some(rest) = remote_url.strip_prefix("git@github.com:") {
        return format!(
            "https://github.com/{}",
            rest.strip_suffix(".git").unwrap_or(rest)
        );
    }
    if remote_url.starts_with("https://") {
        return remote_url
            .strip_suffix(".git")
            .unwrap_or(remote_url)
            .to_string();
    }
    remote_url.to_string()
}

static REPO_RE: OnceLock<Regex> = OnceLock::new();

fn repo_re() -> &'static Regex {
    REPO_RE.get_or_init(|| Regex::new(r"github\.com/([^/]+)/([^/]+)").unwrap())
}

/// `(owner, repo)` extracted from any github.com remote URL form.
pub fn extract_repo_info(remote_url: &str) -> Option<(String, String)> {
    let https = remote_to_https(remote_url);
    let caps = repo_re().captures(&https)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_remote_normalized() {
        assert_eq!(
            remote_to_https("git@github.com:acme/widget.git"),
            "https://github.com/acme/widget"
        );
    }

    #[test]
    fn https_remote_loses_git_suffix() {
        assert_eq!(
            remote_to_https("https://github.com/acme/widget.git"),
            "https://github.com/acme/widget"
        );
        assert_eq!(
            remote_to_https("https://github.com/acme/widget"),
            "https://github.com/acme/widget"
        );
    }

    #[test]
    fn non_github_remote_passes_through() {
        assert_eq!(
            remote_to_https("ssh://git.internal/repo.git"),
            "ssh://git.internal/repo.git"
        );
    }

    #[test]
    fn repo_info_extracted_from_both_forms() {
        assert_eq!(
            extract_repo_info("git@github.com:acme/widget.git"),
            Some(("acme".to_string(), "widget".to_string()))
        );
        assert_eq!(
            extract_repo_info("https://github.com/acme/widget"),
            Some(("acme".to_string(), "widget".to_string()))
        );
        assert_eq!(extract_repo_info("ssh://git.internal/repo.git"), None);
    }

    #[test]
    fn install_hint_is_never_empty() {
        assert!(!install_hint().is_empty());
    }
}
