use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use veil_core::PlaceholderTemplate;

const DICTIONARY_FILE: &str = "keyword_dictionary.json";

/// Simple configuration for veil
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Dictionary record location; the platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,

    #[serde(default)]
    pub placeholder_template: PlaceholderTemplate,

    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Option values used when the command line does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_true")]
    pub include_dictionary: bool,

    #[serde(default)]
    pub anonymize_financial: bool,

    #[serde(default)]
    pub anonymize_pii: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            placeholder_template: PlaceholderTemplate::default(),
            lock_timeout_secs: default_lock_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            include_dictionary: true,
            anonymize_financial: false,
            anonymize_pii: false,
        }
    }
}

fn default_lock_timeout_secs() -> u64 {
    5
}

fn default_cache_ttl_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "veil", "veil") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.veil/config.toml")
        }
    }

    /// Resolved dictionary record path
    pub fn dictionary_path(&self) -> PathBuf {
        if let Some(path) = &self.dictionary_path {
            return path.clone();
        }
        if let Some(dirs) = directories::ProjectDirs::from("com", "veil", "veil") {
            dirs.data_dir().join(DICTIONARY_FILE)
        } else {
            PathBuf::from("~/.veil").join(DICTIONARY_FILE)
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
