use std::path::PathBuf;

pub const CONFIG_DIR_ENV: &str = "SHOOT_CONFIG_DIR";
pub const DEFAULT_HEADERS_ENV: &str = "SHOOT_DEFAULT_HEADERS";

const APP_DIR: &str = "shoot";
const ALIAS_FILE: &str = "aliases.json";
const HISTORY_FILE: &str = "history.jsonl";

/// Locations and environment-provided defaults for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub config_dir: PathBuf,
    pub default_headers: Option<String>,
}

impl Config {
    /// Reads the environment once. Without `SHOOT_CONFIG_DIR`, the platform
    /// config directory is used, or the current directory if there is none.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::config_dir())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, platform_dir: Option<PathBuf>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config_dir = match var(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => platform_dir
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
        };

        Self {
            config_dir,
            default_headers: var(DEFAULT_HEADERS_ENV),
        }
    }

    pub fn alias_file(&self) -> PathBuf {
        self.config_dir.join(ALIAS_FILE)
    }

    pub fn history_file(&self) -> PathBuf {
        self.config_dir.join(HISTORY_FILE)
    }
}
