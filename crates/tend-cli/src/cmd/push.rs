use std::path::Path;

use crate::output::print_json;
use tend_core::git::{Git, VersionControl};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;

    let branch = git.current_branch()?;
    let outcome = git.push(&branch);

    if json {
        return print_json(&outcome);
    }

    if outcome.success {
        println!("Pushed to {branch}");
    } else {
        anyhow::bail!(
            "push failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".into())
        );
    }

    Ok(())
}
