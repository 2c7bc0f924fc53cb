use crate::error::{Result, TendError};
use crate::io;
use crate::paths;
use ai_provider::Provider;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// AutoMode
// ---------------------------------------------------------------------------

/// What the watch engine does once a stable, above-threshold change is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AutoMode {
    Manual,
    Confirm,
    #[default]
    Auto,
}

impl AutoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AutoMode::Manual => "manual",
            AutoMode::Confirm => "confirm",
            AutoMode::Auto => "auto",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AutoMode::Manual => "no automatic commits",
            AutoMode::Confirm => "prompt before commit",
            AutoMode::Auto => "auto-commit when threshold reached",
        }
    }
}

impl std::fmt::Display for AutoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AutoMode {
    type Err = TendError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "manual" => Ok(AutoMode::Manual),
            "confirm" => Ok(AutoMode::Confirm),
            "auto" => Ok(AutoMode::Auto),
            other => Err(TendError::InvalidConfigValue {
                key: "auto_mode".to_string(),
                detail: format!("'{other}' is not one of manual, confirm, auto"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Resolved configuration: defaults, overlaid by the global file, overlaid by
/// the local (per-repository) file. Front-ends reload this once per watch
/// tick so external edits take effect without a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub auto_mode: AutoMode,
    #[serde(default = "default_commit_threshold")]
    pub commit_threshold: u32,
    #[serde(default)]
    pub ai_provider: Provider,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub push_on_commit: bool,
    #[serde(default = "default_true")]
    pub ai_commit_messages: bool,
    #[serde(default = "default_commit_max_chars")]
    pub ai_commit_max_chars: u32,
    #[serde(default)]
    pub ai_commit_prompt: Option<String>,
    #[serde(default)]
    pub ai_branch_prompt: Option<String>,
    #[serde(default = "default_commits_before_summary")]
    pub commits_before_summary: u32,
    #[serde(default = "default_true")]
    pub auto_summary_and_push: bool,
}

fn default_commit_threshold() -> u32 {
    20
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_true() -> bool {
    true
}

fn default_commit_max_chars() -> u32 {
    72
}

fn default_commits_before_summary() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_mode: AutoMode::default(),
            commit_threshold: default_commit_threshold(),
            ai_provider: Provider::default(),
            ai_model: None,
            default_branch: default_branch(),
            push_on_commit: false,
            ai_commit_messages: true,
            ai_commit_max_chars: default_commit_max_chars(),
            ai_commit_prompt: None,
            ai_branch_prompt: None,
            commits_before_summary: default_commits_before_summary(),
            auto_summary_and_push: true,
        }
    }
}

/// All recognized keys, in display order.
pub const KEYS: &[&str] = &[
    "auto_mode",
    "commit_threshold",
    "ai_provider",
    "ai_model",
    "default_branch",
    "push_on_commit",
    "ai_commit_messages",
    "ai_commit_max_chars",
    "ai_commit_prompt",
    "ai_branch_prompt",
    "commits_before_summary",
    "auto_summary_and_push",
];

impl Settings {
    /// Load the layered configuration for `root`.
    /// Missing files are fine; a missing key falls through to the next layer.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(root, &paths::global_config_path()?)
    }

    /// Like [`Settings::load`] with an explicit global-layer path.
    pub fn load_from(root: &Path, global: &Path) -> Result<Self> {
        let mut patch = SettingsPatch::default();
        patch.merge(SettingsPatch::read(global)?);
        patch.merge(SettingsPatch::read(&paths::local_config_path(root))?);
        Ok(patch.resolve())
    }

    pub fn get_display(&self, key: &str) -> Result<String> {
        let v = match key {
            "auto_mode" => self.auto_mode.to_string(),
            "commit_threshold" => self.commit_threshold.to_string(),
            "ai_provider" => self.ai_provider.to_string(),
            "ai_model" => self.ai_model.clone().unwrap_or_else(|| "<not set>".into()),
            "default_branch" => self.default_branch.clone(),
            "push_on_commit" => self.push_on_commit.to_string(),
            "ai_commit_messages" => self.ai_commit_messages.to_string(),
            "ai_commit_max_chars" => self.ai_commit_max_chars.to_string(),
            "ai_commit_prompt" => self
                .ai_commit_prompt
                .clone()
                .unwrap_or_else(|| "<not set>".into()),
            "ai_branch_prompt" => self
                .ai_branch_prompt
                .clone()
                .unwrap_or_else(|| "<not set>".into()),
            "commits_before_summary" => self.commits_before_summary.to_string(),
            "auto_summary_and_push" => self.auto_summary_and_push.to_string(),
            other => return Err(TendError::UnknownConfigKey(other.to_string())),
        };
        Ok(v)
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .map(|k| (*k, self.get_display(k).unwrap_or_default()))
            .collect()
    }

    /// Range checks over resolved values. The per-key `set` path rejects bad
    /// input up front, but hand-edited files arrive through here.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.commit_threshold < 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "commit_threshold must be at least 1".to_string(),
            });
        }

        if !(2..=10).contains(&self.commits_before_summary) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "commits_before_summary={} is out of range (2-10)",
                    self.commits_before_summary
                ),
            });
        }

        if self.ai_commit_max_chars == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ai_commit_max_chars must be positive".to_string(),
            });
        }

        if self.ai_commit_messages && !self.ai_provider.is_enabled() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ai_commit_messages is enabled but ai_provider is 'none' \
                          — commits will use the fallback message"
                    .to_string(),
            });
        }

        if self.default_branch.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "default_branch must not be empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// SettingsPatch: one config layer on disk
// ---------------------------------------------------------------------------

/// A single layer's file contents: only the keys the operator actually set.
/// Serialized keys are omitted when unset so layers stay sparse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_mode: Option<AutoMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_on_commit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_commit_messages: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_commit_max_chars: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_commit_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_branch_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits_before_summary: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_summary_and_push: Option<bool>,
}

impl SettingsPatch {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(path, data.as_bytes())
    }

    /// Overlay `other` onto self: any key set in `other` wins.
    pub fn merge(&mut self, other: SettingsPatch) {
        macro_rules! take {
            ($($field:ident),+) => {
                $(if other.$field.is_some() { self.$field = other.$field; })+
            };
        }
        take!(
            auto_mode,
            commit_threshold,
            ai_provider,
            ai_model,
            default_branch,
            push_on_commit,
            ai_commit_messages,
            ai_commit_max_chars,
            ai_commit_prompt,
            ai_branch_prompt,
            commits_before_summary,
            auto_summary_and_push
        );
    }

    /// Fill unset keys with defaults.
    pub fn resolve(self) -> Settings {
        let d = Settings::default();
        Settings {
            auto_mode: self.auto_mode.unwrap_or(d.auto_mode),
            commit_threshold: self.commit_threshold.unwrap_or(d.commit_threshold),
            ai_provider: self.ai_provider.unwrap_or(d.ai_provider),
            ai_model: self.ai_model.or(d.ai_model),
            default_branch: self.default_branch.unwrap_or(d.default_branch),
            push_on_commit: self.push_on_commit.unwrap_or(d.push_on_commit),
            ai_commit_messages: self.ai_commit_messages.unwrap_or(d.ai_commit_messages),
            ai_commit_max_chars: self.ai_commit_max_chars.unwrap_or(d.ai_commit_max_chars),
            ai_commit_prompt: self.ai_commit_prompt.or(d.ai_commit_prompt),
            ai_branch_prompt: self.ai_branch_prompt.or(d.ai_branch_prompt),
            commits_before_summary: self
                .commits_before_summary
                .unwrap_or(d.commits_before_summary),
            auto_summary_and_push: self
                .auto_summary_and_push
                .unwrap_or(d.auto_summary_and_push),
        }
    }

    /// Parse and validate a textual `value` for `key`, then set it.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "auto_mode" => self.auto_mode = Some(value.parse()?),
            "commit_threshold" => {
                let n = parse_u32(key, value)?;
                if n < 1 {
                    return Err(invalid(key, "must be at least 1"));
                }
                self.commit_threshold = Some(n);
            }
            "ai_provider" => {
                let p: Provider = value.parse().map_err(|_| {
                    invalid(key, "must be gemini, openai, anthropic, ollama, or none")
                })?;
                self.ai_provider = Some(p);
            }
            "ai_model" => self.ai_model = non_empty(value),
            "default_branch" => {
                if value.trim().is_empty() {
                    return Err(invalid(key, "must not be empty"));
                }
                self.default_branch = Some(value.to_string());
            }
            "push_on_commit" => self.push_on_commit = Some(parse_bool(key, value)?),
            "ai_commit_messages" => self.ai_commit_messages = Some(parse_bool(key, value)?),
            "ai_commit_max_chars" => {
                let n = parse_u32(key, value)?;
                if n == 0 {
                    return Err(invalid(key, "must be positive"));
                }
                self.ai_commit_max_chars = Some(n);
            }
            "ai_commit_prompt" => self.ai_commit_prompt = non_empty(value),
            "ai_branch_prompt" => self.ai_branch_prompt = non_empty(value),
            "commits_before_summary" => {
                let n = parse_u32(key, value)?;
                if !(2..=10).contains(&n) {
                    return Err(invalid(key, "must be between 2 and 10"));
                }
                self.commits_before_summary = Some(n);
            }
            "auto_summary_and_push" => {
                self.auto_summary_and_push = Some(parse_bool(key, value)?)
            }
            other => return Err(TendError::UnknownConfigKey(other.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, detail: &str) -> TendError {
    TendError::InvalidConfigValue {
        key: key.to_string(),
        detail: detail.to_string(),
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| invalid(key, "must be a non-negative integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, "must be true or false")),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Scoped set/reset helpers (used by `tend config set` and the web API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Local,
    Global,
}

pub fn scope_path(root: &Path, scope: ConfigScope) -> Result<std::path::PathBuf> {
    match scope {
        ConfigScope::Local => Ok(paths::local_config_path(root)),
        ConfigScope::Global => paths::global_config_path(),
    }
}

/// Set one key in the chosen layer's file.
pub fn set_value(root: &Path, scope: ConfigScope, key: &str, value: &str) -> Result<()> {
    let path = scope_path(root, scope)?;
    let mut patch = SettingsPatch::read(&path)?;
    patch.set_key(key, value)?;
    patch.save(&path)
}

/// Remove the chosen layer entirely, falling back to lower layers/defaults.
pub fn reset(root: &Path, scope: ConfigScope) -> Result<()> {
    let path = scope_path(root, scope)?;
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
