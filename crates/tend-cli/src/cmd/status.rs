use std::path::Path;

use ai_provider::CliGenerator;
use serde_json::json;

use crate::output::{print_json, print_kv};
use tend_core::config::Settings;
use tend_core::git::{Git, VersionControl};
use tend_core::github;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let git = Git::new(root);
    let settings = Settings::load(root)?;
    let gh = github::gh_status();
    let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());

    if json {
        let repo = if git.is_repo() {
            let (modified, untracked) = git.change_counts();
            json!({
                "name": git.repo_name()?,
                "path": git.repo_path()?,
                "branch": git.current_branch()?,
                "remote": git.remote_url(),
                "has_changes": git.has_changes(),
                "change_size": git.change_size(),
                "modified_files": modified,
                "untracked_files": untracked,
                "unpushed_count": git.unpushed_count(),
                "last_commit": git.last_commit(),
            })
        } else {
            serde_json::Value::Null
        };
        return print_json(&json!({
            "repo": repo,
            "config": settings,
            "ai_cli_available": generator.is_available(),
            "gh": { "installed": gh.installed, "authenticated": gh.authenticated },
        }));
    }

    println!("Repository");
    if !git.is_repo() {
        println!("  no git repository detected (run 'tend init')");
    } else {
        let mut rows: Vec<(&str, String)> = vec![
            ("Name", git.repo_name()?),
            ("Path", git.repo_path()?),
            ("Branch", git.current_branch()?),
        ];
        if let Some(last) = git.last_commit() {
            rows.push(("Last commit", last));
        }
        match git.remote_url() {
            Some(url) => {
                rows.push(("Remote", url.clone()));
                rows.push(("GitHub URL", github::remote_to_https(&url)));
                if let Some((ahead, behind)) = git.ahead_behind() {
                    let sync = if ahead == 0 && behind == 0 {
                        "up to date".to_string()
                    } else {
                        format!("{ahead} ahead, {behind} behind")
                    };
                    rows.push(("Sync", sync));
                }
            }
            None => rows.push(("Remote", "<not configured>".to_string())),
        }
        if git.has_changes() {
            let (modified, untracked) = git.change_counts();
            rows.push(("Changes", format!("{} lines", git.change_size())));
            rows.push((
                "Files",
                format!("{modified} modified, {untracked} untracked"),
            ));
        } else {
            rows.push(("Changes", "working tree clean".to_string()));
        }
        print_kv(&rows);
    }

    println!();
    println!("Automation");
    print_kv(&[
        (
            "Mode",
            format!("{} ({})", settings.auto_mode, settings.auto_mode.describe()),
        ),
        (
            "Commit threshold",
            format!("{} lines", settings.commit_threshold),
        ),
        ("Push on commit", settings.push_on_commit.to_string()),
        ("Default branch", settings.default_branch.clone()),
        (
            "Commits before summary",
            settings.commits_before_summary.to_string(),
        ),
        (
            "Auto summary and push",
            settings.auto_summary_and_push.to_string(),
        ),
    ]);

    println!();
    println!("AI provider");
    let mut rows: Vec<(&str, String)> = vec![
        ("Provider", settings.ai_provider.to_string()),
        (
            "Model",
            settings
                .ai_model
                .clone()
                .unwrap_or_else(|| "<not set>".to_string()),
        ),
        ("AI commit messages", settings.ai_commit_messages.to_string()),
    ];
    if settings.ai_provider.is_enabled() {
        let availability = if generator.is_available() {
            format!("{} installed", settings.ai_provider)
        } else {
            format!("{} not found on PATH", settings.ai_provider)
        };
        rows.push(("CLI", availability));
    }
    print_kv(&rows);

    println!();
    println!("GitHub CLI");
    if gh.installed {
        let auth = if gh.authenticated {
            "authenticated".to_string()
        } else {
            "not authenticated (run: gh auth login)".to_string()
        };
        print_kv(&[("gh", "installed".to_string()), ("Auth", auth)]);
    } else {
        print_kv(&[("gh", format!("not installed — {}", github::install_hint()))]);
    }

    Ok(())
}
