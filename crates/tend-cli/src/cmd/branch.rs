use clap::Subcommand;
use std::path::Path;

use crate::output::print_json;
use tend_core::git::Git;

#[derive(Subcommand)]
pub enum BranchSubcommand {
    /// List local and remote branches
    List,

    /// Create a branch and switch to it
    Create {
        /// Branch name
        name: String,
    },

    /// Switch to a branch or ref ("prev"/"next" step through history)
    Switch {
        /// Branch name, ref, or prev/next
        reference: String,
    },
}

pub fn run(root: &Path, subcmd: BranchSubcommand, json: bool) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;

    match subcmd {
        BranchSubcommand::List => {
            let branches = git.branches()?;
            if json {
                return print_json(&branches);
            }
            for branch in branches {
                println!("{branch}");
            }
        }
        BranchSubcommand::Create { name } => {
            git.create_branch(&name)?;
            println!("Created and switched to branch: {name}");
        }
        BranchSubcommand::Switch { reference } => {
            git.switch_branch(&reference)?;
            println!("Switched to {reference}");
        }
    }

    Ok(())
}
