//! Provider selection and CLI invocation.
//!
//! Each provider CLI speaks a different argv dialect; `build_command` is the
//! single place that knows them (mirrors the one-command-builder-per-runtime
//! shape used for tool subprocesses elsewhere in the workspace).

use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::AiProviderError;
use crate::{Result, TextGenerator};

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// The configurable AI backends, plus `None` to disable AI entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Anthropic,
    Ollama,
    None,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Openai => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
            Provider::None => "none",
        }
    }

    /// The binary probed on PATH. `None` for the disabled provider.
    pub fn cli_binary(&self) -> Option<&'static str> {
        match self {
            Provider::Gemini => Some("gemini"),
            Provider::Openai => Some("openai"),
            Provider::Anthropic => Some("anthropic"),
            Provider::Ollama => Some("ollama"),
            Provider::None => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self != Provider::None
    }

    fn install_hint(&self) -> &'static str {
        match self {
            Provider::Gemini => "Install: npm install -g @google/generative-ai-cli",
            Provider::Openai => "Install: pip install openai",
            Provider::Anthropic => "Install: pip install anthropic",
            Provider::Ollama => "Install: https://ollama.com/download",
            Provider::None => "",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash-exp",
            Provider::Openai => "gpt-4",
            Provider::Anthropic => "claude-3-5-sonnet-20241022",
            Provider::Ollama => "llama2",
            Provider::None => "",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = AiProviderError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::Openai),
            "anthropic" => Ok(Provider::Anthropic),
            "ollama" => Ok(Provider::Ollama),
            "none" => Ok(Provider::None),
            other => Err(AiProviderError::GenerationFailed {
                provider: other.to_string(),
                detail: "unknown provider: must be gemini, openai, anthropic, ollama, or none"
                    .to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// CliGenerator
// ---------------------------------------------------------------------------

/// [`TextGenerator`] backed by the configured provider's CLI.
///
/// Each `generate` call is a fresh subprocess: probe the binary, run it with
/// the prompt, capture stdout. There is no session state to manage.
#[derive(Debug, Clone)]
pub struct CliGenerator {
    provider: Provider,
    model: Option<String>,
}

impl CliGenerator {
    pub fn new(provider: Provider, model: Option<String>) -> Self {
        Self { provider, model }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// True when the provider is enabled and its binary is on PATH.
    pub fn is_available(&self) -> bool {
        self.provider
            .cli_binary()
            .map(|bin| which::which(bin).is_ok())
            .unwrap_or(false)
    }

    fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    fn build_command(&self, prompt: &str) -> Command {
        match self.provider {
            Provider::Gemini => {
                let mut cmd = Command::new("gemini");
                if let Some(model) = &self.model {
                    cmd.arg("--model").arg(model);
                }
                // --yolo skips interactive approval; prompt is positional
                // (--prompt is deprecated upstream).
                cmd.arg("--yolo").arg("--output-format").arg("json");
                cmd.arg(prompt);
                cmd
            }
            Provider::Openai => {
                let mut cmd = Command::new("openai");
                cmd.args(["api", "chat.completions.create", "-m"])
                    .arg(self.model())
                    .args(["-g", "user"])
                    .arg(prompt);
                cmd
            }
            Provider::Anthropic => {
                let mut cmd = Command::new("anthropic");
                cmd.args(["messages", "create", "--model"])
                    .arg(self.model())
                    .args(["--max-tokens", "1024", "--message"])
                    .arg(prompt);
                cmd
            }
            Provider::Ollama => {
                let mut cmd = Command::new("ollama");
                cmd.arg("run").arg(self.model()).arg(prompt);
                cmd
            }
            Provider::None => unreachable!("generate() rejects the disabled provider first"),
        }
    }
}

impl TextGenerator for CliGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let Some(binary) = self.provider.cli_binary() else {
            return Err(AiProviderError::Disabled);
        };

        if which::which(binary).is_err() {
            return Err(AiProviderError::ProviderUnavailable {
                provider: self.provider.to_string(),
                hint: self.provider.install_hint().to_string(),
            });
        }

        tracing::debug!(provider = %self.provider, "running AI generation");

        let output = self
            .build_command(prompt)
            .output()
            .map_err(|e| AiProviderError::GenerationFailed {
                provider: self.provider.to_string(),
                detail: format!("failed to spawn {binary}: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail: String = stderr.chars().take(500).collect();
            return Err(AiProviderError::GenerationFailed {
                provider: self.provider.to_string(),
                detail: if detail.trim().is_empty() {
                    format!("exited with status {}", output.status)
                } else {
                    detail
                },
            });
        }

        Ok(unwrap_response(self.provider, &stdout))
    }
}

/// Gemini wraps its answer in a JSON envelope; everything else prints plain
/// text. Malformed JSON falls through to the raw stdout rather than failing.
fn unwrap_response(provider: Provider, stdout: &str) -> String {
    if provider != Provider::Gemini {
        return stdout.to_string();
    }
    match serde_json::from_str::<serde_json::Value>(stdout) {
        Ok(v) => v
            .get("response")
            .or_else(|| v.get("text"))
            .and_then(|s| s.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| stdout.to_string()),
        Err(_) => stdout.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
