use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiProviderError {
    #[error("AI provider disabled: run 'tend ai set-provider <name>'")]
    Disabled,

    #[error("{provider} CLI not installed. {hint}")]
    ProviderUnavailable { provider: String, hint: String },

    #[error("{provider} generation failed: {detail}")]
    GenerationFailed { provider: String, detail: String },
}
