use serde::Deserialize;

use crate::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_SECS};

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_LANGUAGE_ENDPOINT: &str =
    "https://language.googleapis.com/v1/documents:analyzeSentiment";

/// Env var consulted for any service `api_key` left unset in the file.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Total annotation attempts per post; 0 retries forever.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_backoff_secs: default_max_backoff_secs(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_backoff_secs() -> u64 {
    DEFAULT_MAX_BACKOFF_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Cap per requested feature kind.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            api_key: None,
            max_results: default_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_vision_endpoint() -> String {
    DEFAULT_VISION_ENDPOINT.into()
}

fn default_max_results() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    #[serde(default = "default_language_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_language_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_language_endpoint() -> String {
    DEFAULT_LANGUAGE_ENDPOINT.into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Media larger than this is refused.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        let mut config = Self::load_from_str(&s)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.apply_api_key(&key);
        }
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill unset or blank service keys.
    pub fn apply_api_key(&mut self, key: &str) {
        if key.trim().is_empty() {
            return;
        }
        for slot in [&mut self.vision.api_key, &mut self.language.api_key] {
            if slot.as_deref().is_none_or(|k| k.trim().is_empty()) {
                *slot = Some(key.to_string());
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.retry.max_backoff_secs > 0 && self.retry.max_backoff_secs <= 3600,
            "retry.max_backoff_secs must be between 1 and 3600, got {}",
            self.retry.max_backoff_secs
        );
        anyhow::ensure!(
            !self.vision.endpoint.is_empty(),
            "vision.endpoint must be non-empty"
        );
        anyhow::ensure!(
            self.vision.max_results > 0,
            "vision.max_results must be > 0, got {}",
            self.vision.max_results
        );
        anyhow::ensure!(
            self.vision.timeout_secs > 0,
            "vision.timeout_secs must be > 0, got {}",
            self.vision.timeout_secs
        );
        anyhow::ensure!(
            !self.language.endpoint.is_empty(),
            "language.endpoint must be non-empty"
        );
        anyhow::ensure!(
            self.language.timeout_secs > 0,
            "language.timeout_secs must be > 0, got {}",
            self.language.timeout_secs
        );
        anyhow::ensure!(
            self.media.timeout_secs > 0,
            "media.timeout_secs must be > 0, got {}",
            self.media.timeout_secs
        );
        anyhow::ensure!(
            self.media.max_bytes > 0,
            "media.max_bytes must be > 0, got {}",
            self.media.max_bytes
        );
        Ok(())
    }
}
