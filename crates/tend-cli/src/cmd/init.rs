use anyhow::Context;
use std::path::Path;

use tend_core::config::Settings;
use tend_core::git::Git;
use tend_core::{github, io};

pub fn run(
    root: &Path,
    create_remote: bool,
    repo: Option<&str>,
    private: bool,
) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    let git = Git::new(root);

    // Lock files must never end up in the initial commit.
    io::ensure_gitignore_entry(root, ".tend/*.lock")?;

    let outcome = git
        .init_repo(&settings.default_branch)
        .context("failed to initialize repository")?;

    if outcome.already_existed {
        println!("Repository already initialized");
    } else {
        println!(
            "Initialized repository with initial commit on '{}'",
            settings.default_branch
        );
    }

    if create_remote {
        let name = match repo {
            Some(n) => n.to_string(),
            None => git.repo_name().context("failed to derive repository name")?,
        };
        println!("Creating GitHub repository '{name}'...");
        github::create_repo(root, &name, None, private, true)?;
        match git.remote_url() {
            Some(url) => println!("Created and pushed: {}", github::remote_to_https(&url)),
            None => println!("Created GitHub repository '{name}'"),
        }
    }

    Ok(())
}
