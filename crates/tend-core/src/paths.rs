use crate::error::{Result, TendError};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TEND_DIR: &str = ".tend";
pub const LOCAL_CONFIG_FILE: &str = ".tend/config.yaml";
pub const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Environment variable that relocates the global config directory.
/// Used by tests to isolate from the operator's real configuration.
pub const CONFIG_DIR_ENV: &str = "TEND_CONFIG_DIR";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn tend_dir(root: &Path) -> PathBuf {
    root.join(TEND_DIR)
}

pub fn local_config_path(root: &Path) -> PathBuf {
    root.join(LOCAL_CONFIG_FILE)
}

/// Global config file: `$TEND_CONFIG_DIR/config.yaml` if set, otherwise
/// `~/.config/tend/config.yaml`.
pub fn global_config_path() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(GLOBAL_CONFIG_FILE));
    }
    let home = home::home_dir().ok_or(TendError::HomeNotFound)?;
    Ok(home.join(".config").join("tend").join(GLOBAL_CONFIG_FILE))
}

pub fn lock_path(root: &Path, scope: &str) -> PathBuf {
    tend_dir(root).join(format!("{scope}.lock"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
