//! Application configuration with layered loading.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if `MARQUEE_CONFIG_FILE` is set)
//! 3. Environment variables (`MARQUEE_*`)

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// TMDB API key.
    ///
    /// Set via MARQUEE_TMDB_API_KEY. Required only once a client is built.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Base URL of the TMDB v3 API.
    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    /// Path to the SQLite result cache.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Quiet period before typed text is dispatched as a search.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of cached queries.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Items per remote page, used to position cached items.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Load the next page when the last visible item is within this many of the end.
    #[serde(default = "default_load_more_threshold")]
    pub load_more_threshold: usize,

    /// Category sections loaded for the home view.
    #[serde(default = "default_home_categories")]
    pub home_categories: Vec<String>,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./marquee-cache.sqlite")
}

fn default_user_agent() -> String {
    "marquee/0.1".into()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_cache_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY
}

fn default_page_size() -> u32 {
    crate::fetch::DEFAULT_PAGE_SIZE
}

fn default_load_more_threshold() -> usize {
    5
}

fn default_home_categories() -> Vec<String> {
    vec!["now_playing".into(), "popular".into()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: default_tmdb_base_url(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            debounce_ms: default_debounce_ms(),
            cache_capacity: default_cache_capacity(),
            page_size: default_page_size(),
            load_more_threshold: default_load_more_threshold(),
            home_categories: default_home_categories(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Load configuration from all sources and validate it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MARQUEE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("MARQUEE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// The TMDB API key, or an error explaining how to set it.
    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "tmdb_api_key".into(),
                hint: "Set MARQUEE_TMDB_API_KEY environment variable".into(),
            })
    }
}
