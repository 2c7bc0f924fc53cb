use clap::Subcommand;
use std::path::Path;

use ai_provider::{prompts, CliGenerator, Provider, TextGenerator};
use tend_core::config::{self, ConfigScope, Settings};
use tend_core::git::Git;

#[derive(Subcommand)]
pub enum AiSubcommand {
    /// Select the AI provider (gemini, openai, anthropic, ollama, none)
    SetProvider {
        /// Provider name
        provider: String,
    },

    /// Set the model passed to the provider CLI
    SetModel {
        /// Model name (e.g. gemini-2.0-flash-exp, gpt-4o)
        model: String,
    },

    /// Generate a kebab-case branch name from a task description
    Branch {
        /// What the branch will be for
        description: String,

        /// Create and switch to the branch instead of just printing it
        #[arg(long)]
        create: bool,
    },

    /// Round-trip a tiny prompt through the configured provider
    Test,
}

pub fn run(root: &Path, subcmd: AiSubcommand) -> anyhow::Result<()> {
    match subcmd {
        AiSubcommand::SetProvider { provider } => {
            // Provider settings are operator-wide, not per-repository.
            config::set_value(root, ConfigScope::Global, "ai_provider", &provider)?;
            println!("AI provider set to: {provider}");
            Ok(())
        }
        AiSubcommand::SetModel { model } => {
            config::set_value(root, ConfigScope::Global, "ai_model", &model)?;
            println!("AI model set to: {model}");
            Ok(())
        }
        AiSubcommand::Branch {
            description,
            create,
        } => branch(root, &description, create),
        AiSubcommand::Test => test(root),
    }
}

fn branch(root: &Path, description: &str, create: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    if !settings.ai_provider.is_enabled() {
        anyhow::bail!("AI provider is 'none'; run 'tend ai set-provider <name>' first");
    }

    let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());
    let response = generator.generate(&prompts::branch_name(
        description,
        settings.ai_branch_prompt.as_deref(),
    ))?;
    let name = prompts::clean_branch_name(&response);
    if name.is_empty() {
        anyhow::bail!("provider returned an empty branch name");
    }

    if create {
        let git = Git::new(root);
        git.ensure_repo()?;
        git.create_branch(&name)?;
        println!("Created and switched to branch: {name}");
    } else {
        println!("{name}");
    }
    Ok(())
}

fn test(root: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    if settings.ai_provider == Provider::None {
        anyhow::bail!("AI provider is 'none'; run 'tend ai set-provider <name>' first");
    }

    let generator = CliGenerator::new(settings.ai_provider, settings.ai_model.clone());
    println!(
        "Testing {} (model: {})...",
        settings.ai_provider,
        settings.ai_model.as_deref().unwrap_or("<provider default>")
    );

    let response = generator.generate("Reply with the single word: ok")?;
    println!("Response: {}", response.trim());
    Ok(())
}
