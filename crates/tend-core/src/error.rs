use thiserror::Error;

#[derive(Debug, Error)]
pub enum TendError {
    #[error("not a git repository: run 'tend init' first")]
    NotARepository,

    #[error("git {command} failed: {detail}")]
    Git { command: String, detail: String },

    #[error("unknown config key: {0}")]
    UnknownConfigKey(String),

    #[error("invalid value for {key}: {detail}")]
    InvalidConfigValue { key: String, detail: String },

    #[error("another tend {scope} instance is running (PID {pid})")]
    AlreadyRunning { scope: String, pid: u32 },

    #[error("GitHub CLI (gh) not installed: {0}")]
    GhMissing(String),

    #[error("not authenticated with GitHub: run 'gh auth login'")]
    GhNotAuthenticated,

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Ai(#[from] ai_provider::AiProviderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TendError>;
