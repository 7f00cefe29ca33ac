//! TMDB API client.
//!
//! Implements [`ResultFetcher`] over the TMDB v3 REST API.
//!
//! ### Endpoints
//!
//! - **Search**: `GET {base}/search/movie?query=&page=&include_adult=false&language=en-US`
//! - **Categories**: `GET {base}/movie/{category}?page=&language=en-US`, except
//!   `trending`, which maps to `GET {base}/trending/movie/week`.
//! - **Authentication**: `api_key` query parameter.
//!
//! Failures are reported as [`TmdbError`] and converted to the core
//! [`FetchError`] taxonomy at the trait boundary.

pub mod error;
pub mod response;

pub use error::TmdbError;
pub use response::{MovieRecord, PagedResponse};

use async_trait::async_trait;
use marquee_core::{AppConfig, FetchError, Page, ResultFetcher};
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Default base URL for the TMDB v3 API.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "marquee/0.1";

const LANGUAGE: &str = "en-US";

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TmdbConfig {
    /// Build from application configuration.
    ///
    /// Fails with `TmdbError::MissingApiKey` when no key is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, TmdbError> {
        let api_key = config.require_tmdb_api_key().map_err(|_| TmdbError::MissingApiKey)?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: config.tmdb_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// TMDB API client.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    config: Arc<TmdbConfig>,
}

impl TmdbClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        if config.api_key.is_empty() {
            return Err(TmdbError::MissingApiKey);
        }
        Url::parse(&config.base_url).map_err(|e| TmdbError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TmdbError::Network(Arc::new(e)))?;

        Ok(Self { http, config: Arc::new(config) })
    }

    /// Search movies by free text. `page` is 1-based.
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Page, TmdbError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TmdbError::InvalidQuery("query must not be empty".into()));
        }

        let page_param = page.max(1).to_string();
        let url = self.endpoint(
            "search/movie",
            &[("query", query), ("page", &page_param), ("include_adult", "false"), ("language", LANGUAGE)],
        )?;
        self.get_page(url).await
    }

    /// Fetch a category list such as `popular` or `now_playing`.
    pub async fn category(&self, name: &str, page: u32) -> Result<Page, TmdbError> {
        let path = category_path(name)?;
        let page_param = page.max(1).to_string();
        let url = self.endpoint(&path, &[("page", &page_param), ("language", LANGUAGE)])?;
        self.get_page(url).await
    }

    /// Build `{base}/{path}` with the API key and `params` as query pairs.
    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TmdbError> {
        let raw = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| TmdbError::InvalidUrl(format!("{raw}: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.config.api_key);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn get_page(&self, url: Url) -> Result<Page, TmdbError> {
        let start = Instant::now();
        tracing::debug!(path = url.path(), "requesting TMDB");

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(TmdbError::from)?;

        let status = response.status();
        tracing::debug!("TMDB response status: {}", status);

        if !status.is_success() {
            return Err(TmdbError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await.map_err(TmdbError::from)?;
        let raw: PagedResponse = serde_json::from_slice(&bytes).map_err(|e| TmdbError::Parse(e.to_string()))?;

        tracing::debug!(
            "TMDB page {} of {} in {:?}, {} results",
            raw.page,
            raw.total_pages,
            start.elapsed(),
            raw.results.len()
        );

        Ok(Page::from(raw))
    }
}

fn category_path(name: &str) -> Result<String, TmdbError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TmdbError::InvalidQuery(format!("invalid category {name:?}")));
    }

    Ok(match name {
        "trending" => "trending/movie/week".to_string(),
        _ => format!("movie/{name}"),
    })
}

#[async_trait]
impl ResultFetcher for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<Page, FetchError> {
        self.search_movies(query, page).await.map_err(|e| {
            tracing::debug!(query, page, "TMDB search failed: {}", e);
            FetchError::from(e)
        })
    }

    async fn fetch_category(&self, name: &str, page: u32) -> Result<Page, FetchError> {
        self.category(name, page).await.map_err(|e| {
            tracing::debug!(category = name, page, "TMDB category fetch failed: {}", e);
            FetchError::from(e)
        })
    }
}
