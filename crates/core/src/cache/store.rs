//! Backing-store primitives over the two cache tables.
//!
//! The synchronous functions take a `rusqlite::Connection` (or a transaction,
//! which derefs to one) so `ResultCache` can compose them into a single atomic
//! read-merge-write. The async methods on [`CacheDb`] wrap the ones that are
//! used on their own.

use super::connection::CacheDb;
use crate::Error;
use crate::model::{QueryKey, ResultItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};

/// A cached, merged result set for one normalized query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query: QueryKey,
    /// Items in original fetch order, unique by id.
    pub items: Vec<ResultItem>,
    pub last_fetched_page: u32,
    pub total_pages: u32,
    pub last_updated: DateTime<Utc>,
}

impl CacheEntry {
    pub fn has_more_pages(&self) -> bool {
        self.last_fetched_page < self.total_pages
    }
}

/// Insert an empty query record unless one already exists.
pub(crate) fn find_or_create(conn: &Connection, key: &QueryKey, now_us: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cached_queries (query_key, last_fetched_page, total_pages, last_updated_us, update_seq)
         VALUES (?1, 0, 0, ?2, (SELECT COALESCE(MAX(update_seq), 0) + 1 FROM cached_queries))
         ON CONFLICT(query_key) DO NOTHING",
        params![key.as_str(), now_us],
    )?;
    Ok(())
}

/// Record pagination state and bump recency for `key`.
pub(crate) fn touch(
    conn: &Connection, key: &QueryKey, last_fetched_page: u32, total_pages: u32, now_us: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE cached_queries SET
            last_fetched_page = ?2,
            total_pages = ?3,
            last_updated_us = ?4,
            update_seq = (SELECT COALESCE(MAX(update_seq), 0) + 1 FROM cached_queries)
         WHERE query_key = ?1",
        params![key.as_str(), i64::from(last_fetched_page), i64::from(total_pages), now_us],
    )?;
    Ok(())
}

/// Attach `records` to `key` at consecutive positions starting at `first_position`.
///
/// Ids already stored under `key` are skipped and keep their original copy and
/// position. Returns how many records were inserted.
pub(crate) fn append_child_records(
    conn: &Connection, key: &QueryKey, records: &[ResultItem], first_position: i64,
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO cached_items (
            query_key, item_id, position, title, release_date, overview, poster_path, vote_average, vote_count
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(query_key, item_id) DO NOTHING",
    )?;

    let mut inserted = 0;
    for (index, item) in records.iter().enumerate() {
        inserted += stmt.execute(params![
            key.as_str(),
            item.id,
            first_position + index as i64,
            &item.title,
            &item.release_date,
            &item.overview,
            &item.poster_path,
            &item.vote_average,
            &item.vote_count,
        ])?;
    }
    Ok(inserted)
}

/// Delete the least recently updated query records until at most `keep` remain.
///
/// Items go with their query through the cascading foreign key. Returns the
/// number of query records removed.
pub(crate) fn delete_entries_older_than(conn: &Connection, keep: usize) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM cached_queries", [], |row| row.get(0))?;
    let keep = keep as i64;
    if count <= keep {
        return Ok(0);
    }

    conn.execute(
        "DELETE FROM cached_queries WHERE query_key IN (
            SELECT query_key FROM cached_queries
            ORDER BY update_seq ASC
            LIMIT ?1
         )",
        params![count - keep],
    )
}

/// Remove every query record and item.
pub(crate) fn delete_all(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM cached_items", [])?;
    conn.execute("DELETE FROM cached_queries", [])
}

/// Read the entry for `key` with items in stored position order.
pub(crate) fn load_entry(conn: &Connection, key: &QueryKey) -> rusqlite::Result<Option<CacheEntry>> {
    let record = conn
        .query_row(
            "SELECT last_fetched_page, total_pages, last_updated_us FROM cached_queries WHERE query_key = ?1",
            params![key.as_str()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
        )
        .optional()?;

    let Some((last_fetched_page, total_pages, last_updated_us)) = record else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached(
        "SELECT item_id, title, release_date, overview, poster_path, vote_average, vote_count
         FROM cached_items WHERE query_key = ?1 ORDER BY position ASC",
    )?;
    let items = stmt
        .query_map(params![key.as_str()], |row| {
            Ok(ResultItem {
                id: row.get(0)?,
                title: row.get(1)?,
                release_date: row.get(2)?,
                overview: row.get(3)?,
                poster_path: row.get(4)?,
                vote_average: row.get(5)?,
                vote_count: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(CacheEntry {
        query: key.clone(),
        items,
        last_fetched_page: u32::try_from(last_fetched_page).unwrap_or(0),
        total_pages: u32::try_from(total_pages).unwrap_or(0),
        last_updated: DateTime::from_timestamp_micros(last_updated_us).unwrap_or_default(),
    }))
}

impl CacheDb {
    /// Read one entry by normalized key.
    pub async fn load_entry(&self, key: &QueryKey) -> Result<Option<CacheEntry>, Error> {
        let key = key.clone();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> { Ok(load_entry(conn, &key)?) })
            .await
            .map_err(Error::from)
    }

    /// Delete everything. Returns the number of query records removed.
    pub async fn delete_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let deleted = delete_all(&tx)?;
                tx.commit()?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of query records currently stored.
    pub async fn entry_count(&self) -> Result<usize, Error> {
        self.conn
            .call(|conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cached_queries", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    /// Stored keys, least recently updated first.
    pub async fn keys_by_recency(&self) -> Result<Vec<QueryKey>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<QueryKey>, Error> {
                let mut stmt = conn
                    .prepare("SELECT query_key FROM cached_queries ORDER BY update_seq ASC")?;
                let keys = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(keys.iter().map(|k| QueryKey::new(k)).collect())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[i64]) -> Vec<ResultItem> {
        ids.iter().map(|id| ResultItem::new(*id, format!("item {id}"))).collect()
    }

    async fn seed(db: &CacheDb, key: &str, ids: &'static [i64], first_position: i64, now_us: i64) {
        let key = QueryKey::new(key);
        db.conn
            .call(move |conn| -> Result<(), Error> {
                find_or_create(conn, &key, now_us)?;
                append_child_records(conn, &key, &items(ids), first_position)?;
                touch(conn, &key, 1, 1, now_us)?;
                Ok(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.load_entry(&QueryKey::new("nothing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_skips_existing_ids() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "bat", &[1, 2, 3], 0, 1).await;
        seed(&db, "bat", &[4, 1, 5], 20, 2).await;

        let entry = db.load_entry(&QueryKey::new("bat")).await.unwrap().unwrap();
        let ids: Vec<i64> = entry.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_delete_entries_older_than_keeps_newest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "a", &[1], 0, 100).await;
        seed(&db, "b", &[2], 0, 200).await;
        seed(&db, "c", &[3], 0, 300).await;

        let deleted = db
            .conn
            .call(|conn| -> Result<usize, Error> { Ok(delete_entries_older_than(conn, 2)?) })
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let keys = db.keys_by_recency().await.unwrap();
        assert_eq!(keys, vec![QueryKey::new("b"), QueryKey::new("c")]);
    }

    #[tokio::test]
    async fn test_eviction_follows_write_order_not_timestamp() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "a", &[1], 0, 2_000).await;
        seed(&db, "b", &[2], 0, 1_000).await;

        let deleted = db
            .conn
            .call(|conn| -> Result<usize, Error> { Ok(delete_entries_older_than(conn, 1)?) })
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.keys_by_recency().await.unwrap(), vec![QueryKey::new("b")]);
    }

    #[tokio::test]
    async fn test_items_cascade_with_query() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seed(&db, "a", &[1, 2], 0, 1).await;
        db.delete_all().await.unwrap();

        let orphans: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM cached_items", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }
}
