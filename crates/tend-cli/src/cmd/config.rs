use clap::Subcommand;
use std::path::Path;

use crate::output::{print_json, print_kv};
use tend_core::config::{self, ConfigScope, Settings, WarnLevel};
use tend_core::paths;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show all resolved configuration values
    Show,

    /// Get one configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set one configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
        /// Write to the global layer instead of the repository-local one
        #[arg(long)]
        global: bool,
    },

    /// Remove a configuration layer, restoring defaults
    Reset {
        /// Reset the global layer instead of the repository-local one
        #[arg(long)]
        global: bool,
    },

    /// Print the configuration file paths
    Path,

    /// Validate the resolved configuration
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Get { key } => get(root, &key),
        ConfigSubcommand::Set { key, value, global } => set(root, &key, &value, global),
        ConfigSubcommand::Reset { global } => reset(root, global),
        ConfigSubcommand::Path => path(root),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    if json {
        return print_json(&settings);
    }
    let entries = settings.entries();
    let rows: Vec<(&str, String)> = entries.iter().map(|(k, v)| (*k, v.clone())).collect();
    print_kv(&rows);
    Ok(())
}

fn get(root: &Path, key: &str) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    println!("{}", settings.get_display(key)?);
    Ok(())
}

fn set(root: &Path, key: &str, value: &str, global: bool) -> anyhow::Result<()> {
    let scope = if global {
        ConfigScope::Global
    } else {
        ConfigScope::Local
    };
    config::set_value(root, scope, key, value)?;
    println!("Set {key} = {value}");
    Ok(())
}

fn reset(root: &Path, global: bool) -> anyhow::Result<()> {
    let scope = if global {
        ConfigScope::Global
    } else {
        ConfigScope::Local
    };
    config::reset(root, scope)?;
    let layer = if global { "global" } else { "local" };
    println!("Reset {layer} configuration to defaults");
    Ok(())
}

fn path(root: &Path) -> anyhow::Result<()> {
    print_kv(&[
        ("Local", paths::local_config_path(root).display().to_string()),
        ("Global", paths::global_config_path()?.display().to_string()),
    ]);
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    let warnings = settings.validate();

    if json {
        return print_json(&serde_json::json!({ "warnings": warnings }));
    }

    if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
