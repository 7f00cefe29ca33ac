//! Home view category sections.
//!
//! Each category (`now_playing`, `popular`, ...) is fetched as page 1 and
//! written through to the cache under `home:<category>` as a single-page
//! entry. When the fetch fails, the cached section is used instead.

use crate::cache::ResultStore;
use crate::error::FetchError;
use crate::fetch::ResultFetcher;
use crate::model::{QueryKey, ResultItem};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Loaded home sections by category name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HomeSections {
    pub sections: BTreeMap<String, Vec<ResultItem>>,
    /// Categories that were served from the cache.
    pub from_cache: Vec<String>,
}

impl HomeSections {
    pub fn get(&self, category: &str) -> Option<&[ResultItem]> {
        self.sections.get(category).map(Vec::as_slice)
    }

    pub fn is_loaded(&self, category: &str) -> bool {
        self.sections.get(category).is_some_and(|items| !items.is_empty())
    }
}

/// Where a category's items came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CategorySource {
    Remote(Vec<ResultItem>),
    Cached(Vec<ResultItem>),
}

/// Loads category sections through the fetcher with cache fallback.
#[derive(Clone)]
pub struct HomeFeed {
    fetcher: Arc<dyn ResultFetcher>,
    store: Arc<dyn ResultStore>,
    categories: Vec<String>,
}

impl HomeFeed {
    pub fn new(fetcher: Arc<dyn ResultFetcher>, store: Arc<dyn ResultStore>, categories: Vec<String>) -> Self {
        Self { fetcher, store, categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Fetch one category, falling back to its cached copy on failure.
    pub async fn load_category(&self, name: &str) -> Result<CategorySource, FetchError> {
        let key = QueryKey::category(name);

        match self.fetcher.fetch_category(name, 1).await {
            Ok(page) => {
                if let Err(e) = self.store.save_results(key.as_str(), &page.items, 1, 1).await {
                    tracing::warn!(category = name, "failed to cache category: {}", e);
                }
                Ok(CategorySource::Remote(page.items))
            }
            Err(fetch_err) => {
                tracing::debug!(category = name, error = %fetch_err, "category fetch failed, trying cache");
                match self.store.get_results(key.as_str()).await {
                    Ok(Some(entry)) => Ok(CategorySource::Cached(entry.items)),
                    Ok(None) => Err(fetch_err),
                    Err(e) => {
                        tracing::warn!(category = name, "failed to read cached category: {}", e);
                        Err(fetch_err)
                    }
                }
            }
        }
    }

    /// Load every configured category not already present in `existing`.
    ///
    /// Categories that fail with nothing cached are left out.
    pub async fn load(&self, existing: &HomeSections) -> HomeSections {
        let mut sections = existing.clone();

        for name in &self.categories {
            if sections.is_loaded(name) {
                continue;
            }

            match self.load_category(name).await {
                Ok(CategorySource::Remote(items)) => {
                    sections.from_cache.retain(|c| c != name);
                    sections.sections.insert(name.clone(), items);
                }
                Ok(CategorySource::Cached(items)) => {
                    if !sections.from_cache.contains(name) {
                        sections.from_cache.push(name.clone());
                    }
                    sections.sections.insert(name.clone(), items);
                }
                Err(e) => {
                    tracing::warn!(category = %name, "failed to load category: {}", e.message());
                }
            }
        }

        sections
    }
}
