//! Validation of loaded configuration values.

use crate::config::AppConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.debounce_ms > 10_000 {
            return Err(invalid("debounce_ms", "must not exceed 10 seconds"));
        }

        if self.cache_capacity == 0 {
            return Err(invalid("cache_capacity", "must be greater than 0"));
        }

        if self.page_size == 0 {
            return Err(invalid("page_size", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.tmdb_base_url.is_empty() {
            return Err(invalid("tmdb_base_url", "must not be empty"));
        }

        if let Some(bad) = self
            .home_categories
            .iter()
            .find(|c| c.is_empty() || !c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
        {
            return Err(ConfigError::Invalid {
                field: "home_categories".into(),
                reason: format!("invalid category name {bad:?}: use letters, digits and '_'"),
            });
        }

        if self.load_more_threshold == 0 {
            tracing::warn!("load_more_threshold is 0; infinite scroll will never request another page");
        }

        Ok(())
    }
}
