//! The remote fetch collaborator.
//!
//! The core never talks HTTP itself; it drives an implementation of
//! [`ResultFetcher`] (see `marquee-client` for the TMDB one).

use crate::error::FetchError;
use crate::model::ResultItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Number of items the remote endpoint returns per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page of results with pagination metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<ResultItem>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

impl Page {
    pub fn has_more_pages(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn next_page(&self) -> Option<u32> {
        self.has_more_pages().then_some(self.page + 1)
    }
}

/// Performs paginated remote fetches.
///
/// Timeouts are the implementation's concern and must surface as
/// [`FetchError::Connectivity`] or [`FetchError::Unknown`].
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    /// Search by free text. `page` is 1-based.
    async fn search(&self, query: &str, page: u32) -> Result<Page, FetchError>;

    /// Fetch a named category section (e.g. `popular`).
    async fn fetch_category(&self, name: &str, page: u32) -> Result<Page, FetchError>;
}
