//! Client code for marquee.
//!
//! This crate provides the TMDB implementation of the core `ResultFetcher`
//! used by the server.

pub mod tmdb;

pub use tmdb::{TmdbClient, TmdbConfig, TmdbError};
