use std::path::Path;

use tend_core::git::Git;

pub fn run(root: &Path, count: usize) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;
    println!("{}", git.log_oneline(count)?);
    Ok(())
}
