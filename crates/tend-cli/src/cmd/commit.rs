use std::path::Path;

use chrono::Local;

use crate::output::print_json;
use tend_core::config::Settings;
use tend_core::git::{Git, VersionControl};
use tend_core::watch::one_shot_commit_message;

pub fn run(
    root: &Path,
    message: Option<&str>,
    no_ai: bool,
    push: bool,
    json: bool,
) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;
    let settings = Settings::load(root)?;

    let message = match message {
        Some(m) => m.to_string(),
        None if no_ai => format!("chore: update {}", Local::now().format("%Y-%m-%d")),
        None => one_shot_commit_message(&settings, &git),
    };

    let outcome = git.commit(&message)?;

    if json {
        return print_json(&outcome);
    }

    if !outcome.committed {
        println!("{}", outcome.message);
        return Ok(());
    }
    println!("Committed: {message}");

    if push || settings.push_on_commit {
        let branch = git.current_branch()?;
        let result = git.push(&branch);
        if result.success {
            println!("Pushed to {branch}");
        } else {
            println!(
                "Push failed: {}",
                result.error.unwrap_or_else(|| "unknown error".into())
            );
        }
    }

    Ok(())
}
