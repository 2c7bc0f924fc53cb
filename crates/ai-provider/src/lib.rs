//! `ai-provider`: text generation through AI provider CLIs.
//!
//! tend never talks to an AI API directly. Each supported provider ships its
//! own command-line client (gemini, openai, anthropic, ollama); this crate
//! detects the binary, builds the provider-specific argv, runs it as a
//! one-shot subprocess, and returns the generated text.
//!
//! ```text
//! Provider (config)
//!     │
//!     ▼
//! CliGenerator   ← probes the binary with `which`, spawns it per request
//!     │
//!     ▼
//! TextGenerator  ← the trait the watch engine and commands consume
//! ```
//!
//! Failures are typed so callers can fall back deterministically:
//! [`AiProviderError::ProviderUnavailable`] (binary missing),
//! [`AiProviderError::GenerationFailed`] (non-zero exit, malformed output),
//! [`AiProviderError::Disabled`] (provider configured as `none`).
//! A generation failure must never block a commit: every call site is
//! expected to carry a non-AI fallback.

pub mod error;
pub mod prompts;
pub mod provider;

pub use error::AiProviderError;
pub use provider::{CliGenerator, Provider};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AiProviderError>;

/// A source of generated text. Implemented by [`CliGenerator`] for real
/// providers; test suites substitute scripted implementations.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}
