//! Core types and shared functionality for marquee.
//!
//! This crate provides:
//! - Result cache with SQLite backend and LRU eviction
//! - Search session state machine and query dispatcher
//! - The `ResultFetcher` seam implemented by `marquee-client`
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod cancel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod home;
pub mod model;
pub mod session;

pub use cache::{CacheDb, CacheEntry, ResultCache, ResultStore};
pub use config::AppConfig;
pub use dispatcher::{DispatcherConfig, QueryDispatcher};
pub use error::{Error, FetchError};
pub use favorites::{FavoriteIndex, FavoriteSet, NoFavorites, Subscription};
pub use fetch::{Page, ResultFetcher};
pub use home::{HomeFeed, HomeSections};
pub use model::{QueryKey, ResultItem};
pub use session::{SessionSnapshot, SessionStatus};
