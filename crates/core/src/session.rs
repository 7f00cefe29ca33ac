//! Search session state machine.
//!
//! A [`SearchSession`] holds the active query, the aggregated results across
//! fetched pages, the pagination cursor and the current [`SessionStatus`]. It
//! owns the merge rule and the cache-fallback policy but performs no I/O: the
//! dispatcher feeds it fetch outcomes and cache entries.
//!
//! ```text
//! Idle ──search──▶ Loading ──ok, non-empty──▶ Loaded
//!                     │ ──ok, empty─────────▶ Empty
//!                     │ ──failed, cache hit─▶ Loaded | Empty (cached)
//!                     └ ──failed, no cache──▶ Error(kind)
//! any ──query cleared──▶ Idle
//! ```

use crate::cache::CacheEntry;
use crate::error::FetchError;
use crate::fetch::Page;
use crate::model::{ResultItem, dedup_by_id};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Observable state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Loading,
    Loaded,
    Empty,
    Error(FetchError),
}

impl SessionStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, SessionStatus::Error(_))
    }
}

/// How a failed fetch is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Try the cached entry for the query; report the failure if there is none.
    FallbackToCache,
    /// Report the failure and keep the items already shown.
    Surface,
}

impl FailurePolicy {
    /// Connectivity failures always try the cache. Anything else only does so
    /// for the first page.
    pub fn for_failure(error: &FetchError, page: u32) -> Self {
        if error.is_connectivity() || page <= 1 { FailurePolicy::FallbackToCache } else { FailurePolicy::Surface }
    }
}

/// Immutable view of a session handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub query: Option<String>,
    pub status: SessionStatus,
    pub aggregated_items: Vec<ResultItem>,
    pub is_loading_more: bool,
    pub is_using_cached_data: bool,
    pub current_page: u32,
    pub total_pages: u32,
    /// Ids among `aggregated_items` that are marked as favorites.
    pub favorite_ids: BTreeSet<i64>,
    /// Human-readable text for an `Error` status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Dispatch generation this snapshot reflects.
    pub generation: u64,
}

impl SessionSnapshot {
    pub fn is_in_flight(&self) -> bool {
        self.is_loading_more || self.status == SessionStatus::Loading
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SearchSession::new().snapshot(|_| false)
    }
}

#[derive(Debug, Clone)]
pub struct SearchSession {
    current_query: Option<String>,
    current_page: u32,
    total_pages: u32,
    items: Vec<ResultItem>,
    ids: HashSet<i64>,
    status: SessionStatus,
    using_cached_data: bool,
    loading_more: bool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            current_query: None,
            current_page: 0,
            total_pages: 0,
            items: Vec::new(),
            ids: HashSet::new(),
            status: SessionStatus::Idle,
            using_cached_data: false,
            loading_more: false,
        }
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn current_query(&self) -> Option<&str> {
        self.current_query.as_deref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn is_using_cached_data(&self) -> bool {
        self.using_cached_data
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Whether a fetch for this session is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.loading_more || self.status == SessionStatus::Loading
    }

    /// Start a new search for `query`: clear results and enter `Loading`.
    pub fn begin_search(&mut self, query: &str) {
        self.current_query = Some(query.to_string());
        self.current_page = 0;
        self.total_pages = 0;
        self.replace_items(Vec::new());
        self.status = SessionStatus::Loading;
        self.using_cached_data = false;
        self.loading_more = false;
    }

    /// Mark a follow-up page request as in flight.
    pub fn begin_next_page(&mut self) {
        self.loading_more = true;
    }

    /// Next page to request when the user has scrolled to `last_visible_id`.
    ///
    /// Returns `None` while a fetch is in flight, once every page is loaded, or
    /// when the item is not among the last `threshold` aggregated items.
    pub fn next_page_for(&self, last_visible_id: i64, threshold: usize) -> Option<u32> {
        if self.current_query.is_none() || self.is_in_flight() || self.current_page >= self.total_pages {
            return None;
        }

        let index = self.items.iter().position(|item| item.id == last_visible_id)?;
        (index >= self.items.len().saturating_sub(threshold)).then_some(self.current_page + 1)
    }

    /// Merge a successfully fetched page.
    ///
    /// Page 1 replaces the aggregated items. Later pages append only ids not
    /// already present; a repeated id keeps its first-seen copy.
    pub fn apply_page(&mut self, requested_page: u32, page: Page) {
        if requested_page <= 1 {
            self.replace_items(page.items);
        } else {
            for item in page.items {
                if self.ids.insert(item.id) {
                    self.items.push(item);
                }
            }
        }

        self.set_cursor(requested_page.max(1), page.total_pages);
        self.loading_more = false;
        self.status = self.settled_status();
    }

    /// Adopt a cached entry after a failed fetch.
    pub fn apply_cached(&mut self, entry: CacheEntry) {
        self.replace_items(entry.items);
        self.set_cursor(entry.last_fetched_page, entry.total_pages);
        self.loading_more = false;
        self.using_cached_data = true;
        self.status = self.settled_status();
    }

    /// Record a failure that could not be recovered. Aggregated items are kept.
    pub fn apply_failure(&mut self, error: FetchError) {
        self.loading_more = false;
        self.status = SessionStatus::Error(error);
    }

    /// Return to `Idle`, forgetting the query and its results.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn snapshot(&self, is_favorite: impl Fn(i64) -> bool) -> SessionSnapshot {
        let error_message = match &self.status {
            SessionStatus::Error(kind) => Some(kind.message()),
            _ => None,
        };

        SessionSnapshot {
            query: self.current_query.clone(),
            status: self.status.clone(),
            aggregated_items: self.items.clone(),
            is_loading_more: self.loading_more,
            is_using_cached_data: self.using_cached_data,
            current_page: self.current_page,
            total_pages: self.total_pages,
            favorite_ids: self.items.iter().map(|i| i.id).filter(|id| is_favorite(*id)).collect(),
            error_message,
            generation: 0,
        }
    }

    fn replace_items(&mut self, items: Vec<ResultItem>) {
        self.items = dedup_by_id(items);
        self.ids = self.items.iter().map(|i| i.id).collect();
    }

    // Keeps current_page <= total_pages even if the server under-reports.
    fn set_cursor(&mut self, page: u32, total_pages: u32) {
        self.current_page = page;
        self.total_pages = total_pages.max(page);
    }

    fn settled_status(&self) -> SessionStatus {
        if self.items.is_empty() { SessionStatus::Empty } else { SessionStatus::Loaded }
    }
}
