//! SQLite-backed cache of merged search results.
//!
//! Query records and their items are two tables. Access goes through
//! tokio-rusqlite, so one background thread executes every operation and each
//! read-merge-write runs as a single transaction.
//!
//! - Automatic schema migrations
//! - WAL mode
//! - LRU eviction down to a fixed number of queries

pub mod connection;
pub mod migrations;
pub mod results;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use results::{DEFAULT_CAPACITY, ResultCache, ResultStore};
pub use store::CacheEntry;
