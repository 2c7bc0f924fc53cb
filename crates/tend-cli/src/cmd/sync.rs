use std::path::Path;

use anyhow::Context;
use tend_core::git::Git;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;
    git.pull_rebase()
        .context("sync failed (rebase conflict?)")?;
    println!("Up to date");
    Ok(())
}
