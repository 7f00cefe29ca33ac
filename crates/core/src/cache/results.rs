//! Bounded result cache keyed by normalized query.
//!
//! [`ResultCache`] owns the merge and eviction policy on top of the
//! [`CacheDb`] primitives:
//!
//! - keys are normalized (`" Bat "`, `"bat"` and `"BAT"` share an entry)
//! - items merge by id, positioned at `(page - 1) * page_size + index`
//! - after every write the least recently updated entries are evicted until
//!   at most `capacity` remain
//!
//! Category sections are ordinary single-page entries under `home:<name>`.

use super::connection::CacheDb;
use super::store::{self, CacheEntry};
use crate::Error;
use crate::fetch::DEFAULT_PAGE_SIZE;
use crate::model::{QueryKey, ResultItem};
use async_trait::async_trait;
use chrono::Utc;

/// Default number of query entries kept.
pub const DEFAULT_CAPACITY: usize = 10;

/// Read/write access to cached result sets.
///
/// Sessions depend on this trait rather than on SQLite directly.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Merge one fetched page into the entry for `query`, creating it if needed.
    async fn save_results(&self, query: &str, items: &[ResultItem], page: u32, total_pages: u32)
    -> Result<(), Error>;

    /// The entry for `query`, items in fetch order, or `None` if absent.
    async fn get_results(&self, query: &str) -> Result<Option<CacheEntry>, Error>;

    /// Remove every entry. Returns how many entries were removed.
    async fn clear(&self) -> Result<u64, Error>;
}

/// SQLite-backed [`ResultStore`] with LRU eviction.
#[derive(Debug, Clone)]
pub struct ResultCache {
    db: CacheDb,
    capacity: usize,
    page_size: u32,
}

impl ResultCache {
    pub fn new(db: CacheDb) -> Self {
        Self { db, capacity: DEFAULT_CAPACITY, page_size: DEFAULT_PAGE_SIZE }
    }

    /// Override the entry limit. A capacity of zero is treated as one.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Override the page size used for position computation.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn entry_count(&self) -> Result<usize, Error> {
        self.db.entry_count().await
    }

    /// Stored keys, least recently updated first.
    pub async fn keys_by_recency(&self) -> Result<Vec<QueryKey>, Error> {
        self.db.keys_by_recency().await
    }

    fn first_position(&self, page: u32) -> i64 {
        i64::from(page.max(1) - 1) * i64::from(self.page_size)
    }
}

#[async_trait]
impl ResultStore for ResultCache {
    async fn save_results(
        &self, query: &str, items: &[ResultItem], page: u32, total_pages: u32,
    ) -> Result<(), Error> {
        let key = QueryKey::new(query);
        if key.is_empty() {
            return Err(Error::InvalidInput("cache key cannot be empty".into()));
        }

        let items = items.to_vec();
        let page = page.max(1);
        let first_position = self.first_position(page);
        let capacity = self.capacity;
        let now_us = Utc::now().timestamp_micros();
        let log_key = key.clone();

        let (inserted, evicted) = self
            .db
            .conn
            .call(move |conn| -> Result<(usize, usize), Error> {
                let tx = conn.transaction()?;
                store::find_or_create(&tx, &key, now_us)?;
                let inserted = store::append_child_records(&tx, &key, &items, first_position)?;
                store::touch(&tx, &key, page, total_pages, now_us)?;
                let evicted = store::delete_entries_older_than(&tx, capacity)?;
                tx.commit()?;
                Ok((inserted, evicted))
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(query = %log_key, page, inserted, evicted, "saved results to cache");
        Ok(())
    }

    async fn get_results(&self, query: &str) -> Result<Option<CacheEntry>, Error> {
        let key = QueryKey::new(query);
        let entry = self.db.load_entry(&key).await?;
        if entry.is_some() {
            tracing::debug!(query = %key, "cache hit");
        }
        Ok(entry)
    }

    async fn clear(&self) -> Result<u64, Error> {
        let deleted = self.db.delete_all().await?;
        tracing::debug!(deleted, "cleared result cache");
        Ok(deleted)
    }
}
