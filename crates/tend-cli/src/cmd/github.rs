use clap::Subcommand;
use std::path::Path;

use ai_provider::{prompts, CliGenerator, TextGenerator};
use anyhow::Context;
use tend_core::config::Settings;
use tend_core::git::Git;
use tend_core::github;

#[derive(Subcommand)]
pub enum GithubSubcommand {
    /// Check gh installation and authentication
    Check,

    /// Create a GitHub repository for this project and connect it as origin
    Create {
        /// Repository name (default: repository directory name)
        #[arg(long)]
        name: Option<String>,

        /// Create as private
        #[arg(long)]
        private: bool,

        /// Repository description (default: AI-generated when enabled)
        #[arg(long)]
        description: Option<String>,

        /// Don't push the current branch after creation
        #[arg(long)]
        no_push: bool,
    },

    /// Set the origin remote URL
    SetUrl {
        /// Remote URL (https or ssh)
        url: String,
    },
}

pub fn run(root: &Path, subcmd: GithubSubcommand) -> anyhow::Result<()> {
    match subcmd {
        GithubSubcommand::Check => check(root),
        GithubSubcommand::Create {
            name,
            private,
            description,
            no_push,
        } => create(root, name.as_deref(), private, description, no_push),
        GithubSubcommand::SetUrl { url } => set_url(root, &url),
    }
}

fn check(root: &Path) -> anyhow::Result<()> {
    let status = github::gh_status();
    if !status.installed {
        println!("gh: not installed");
        println!("  {}", github::install_hint());
        return Ok(());
    }
    println!("gh: installed");
    if status.authenticated {
        println!("auth: authenticated");
    } else {
        println!("auth: not authenticated");
        println!("  Run: gh auth login");
    }

    let git = Git::new(root);
    if let Some(url) = git.is_repo().then(|| git.remote_url()).flatten() {
        match github::extract_repo_info(&url) {
            Some((owner, repo)) => println!("remote: github.com/{owner}/{repo}"),
            None => println!("remote: {url} (not a GitHub remote)"),
        }
    }
    Ok(())
}

fn create(
    root: &Path,
    name: Option<&str>,
    private: bool,
    description: Option<String>,
    no_push: bool,
) -> anyhow::Result<()> {
    let git = Git::new(root);
    git.ensure_repo()?;
    github::ensure_gh_ready()?;

    let settings = Settings::load(root)?;
    let name = match name {
        Some(n) => n.to_string(),
        None => git.repo_name().context("failed to derive repository name")?,
    };

    let description = match description {
        Some(d) => Some(d),
        None => generate_description(&settings, root, &name),
    };

    ensure_readme(&settings, root, &name, description.as_deref())?;

    println!(
        "Creating {} GitHub repository '{name}'...",
        if private { "private" } else { "public" }
    );
    github::create_repo(root, &name, description.as_deref(), private, !no_push)?;

    match git.remote_url() {
        Some(url) => println!("Created: {}", github::remote_to_https(&url)),
        None => println!("Created GitHub repository '{name}'"),
    }
    Ok(())
}

/// One-sentence repository description via the AI provider; None when
/// disabled or failing (gh accepts a missing description).
fn generate_description(settings: &Settings, root: &Path, name: &str) -> Option<String> {
    if !settings.ai_provider.is_enabled() {
        return None;
    }
    let files = top_level_files(root, 5);
    let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());
    match generator.generate(&prompts::project_description(name, &files)) {
        Ok(response) => {
            let cleaned = prompts::clean_single_line(&response);
            (!cleaned.is_empty()).then_some(cleaned)
        }
        Err(e) => {
            tracing::warn!("AI description generation failed: {e}");
            None
        }
    }
}

/// Seed a README before the repo goes public: AI-generated when possible,
/// a plain scaffold otherwise.
fn ensure_readme(
    settings: &Settings,
    root: &Path,
    name: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    let readme = root.join("README.md");
    if readme.exists() {
        return Ok(());
    }

    let content = if settings.ai_provider.is_enabled() {
        let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());
        match generator.generate(&prompts::readme(name, description.unwrap_or(""))) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => default_readme(name, description),
        }
    } else {
        default_readme(name, description)
    };

    std::fs::write(&readme, content + "\n")?;
    println!("Created README.md");
    Ok(())
}

fn default_readme(name: &str, description: Option<&str>) -> String {
    format!(
        "# {name}\n\n{}\n\n## Getting Started\n\nSee the project documentation.\n\n## License\n\nMIT",
        description.unwrap_or("A new project")
    )
}

fn top_level_files(root: &Path, limit: usize) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| !n.starts_with('.') && n != "node_modules" && n != "target")
        .take(limit)
        .collect()
}

fn set_url(root: &Path, url: &str) -> anyhow::Result<()> {
    if !url.contains("github.com") {
        anyhow::bail!("must be a GitHub URL");
    }
    let git = Git::new(root);
    git.ensure_repo()?;
    git.set_remote_url(url)?;
    println!("Remote set to {url}");
    Ok(())
}
