mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    ai::AiSubcommand, branch::BranchSubcommand, config::ConfigSubcommand,
    github::GithubSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tend",
    about = "Watch your working tree — stability-gated auto-commits, AI commit messages, \
             and push escalation over git and the GitHub CLI",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .git/ or .tend/)
    #[arg(long, global = true, env = "TEND_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a git repository with an initial commit
    Init {
        /// Create a GitHub remote after init (requires gh)
        #[arg(long)]
        create_remote: bool,

        /// Repository name for GitHub (default: directory name)
        #[arg(long)]
        repo: Option<String>,

        /// Create the GitHub repository as private
        #[arg(long)]
        private: bool,
    },

    /// Show repository, automation, AI, and GitHub CLI status
    Status,

    /// Stage everything and commit now (AI message unless -m/--no-ai)
    Commit {
        /// Commit message (skips AI generation)
        #[arg(short, long)]
        message: Option<String>,

        /// Use the deterministic fallback message instead of AI
        #[arg(long)]
        no_ai: bool,

        /// Push after committing
        #[arg(long)]
        push: bool,
    },

    /// Push the current branch, creating the upstream if absent
    Push,

    /// Sync with the remote (pull --rebase)
    Sync,

    /// Manage branches
    Branch {
        #[command(subcommand)]
        subcommand: BranchSubcommand,
    },

    /// Show the recent commit graph
    Log {
        /// Number of commits
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Watch for changes and auto-commit/push once they stabilize
    Watch {
        /// Run until the first resolution (or clean tree), then exit
        #[arg(long)]
        once: bool,

        /// Sampling interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
    },

    /// Manage layered configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Configure and probe the AI provider
    Ai {
        #[command(subcommand)]
        subcommand: AiSubcommand,
    },

    /// GitHub CLI integration (setup check, repo creation, remote URL)
    Github {
        #[command(subcommand)]
        subcommand: GithubSubcommand,
    },

    /// Launch the web dashboard
    Web {
        /// Port to listen on (0 = OS-assigned)
        #[arg(short, long, default_value = "0")]
        port: u16,

        /// Don't open the browser automatically
        #[arg(long)]
        no_open: bool,

        /// Don't start watch mode automatically
        #[arg(long)]
        no_watch: bool,

        /// Take over a stale or foreign instance lock
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Web { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            create_remote,
            repo,
            private,
        } => cmd::init::run(&root, create_remote, repo.as_deref(), private),
        Commands::Status => cmd::status::run(&root, cli.json),
        Commands::Commit {
            message,
            no_ai,
            push,
        } => cmd::commit::run(&root, message.as_deref(), no_ai, push, cli.json),
        Commands::Push => cmd::push::run(&root, cli.json),
        Commands::Sync => cmd::sync::run(&root),
        Commands::Branch { subcommand } => cmd::branch::run(&root, subcommand, cli.json),
        Commands::Log { count } => cmd::log::run(&root, count),
        Commands::Watch { once, interval } => cmd::watch::run(&root, once, interval),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Ai { subcommand } => cmd::ai::run(&root, subcommand),
        Commands::Github { subcommand } => cmd::github::run(&root, subcommand),
        Commands::Web {
            port,
            no_open,
            no_watch,
            force,
        } => cmd::web::run(&root, port, no_open, no_watch, force),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
