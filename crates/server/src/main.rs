//! marquee server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use marquee_client::{TmdbClient, TmdbConfig};
use marquee_core::{AppConfig, CacheDb, DispatcherConfig, FavoriteSet, HomeFeed, QueryDispatcher, ResultCache};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(db_path = %config.db_path.display(), "Starting marquee server on stdio transport");

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening result cache at {}", config.db_path.display()))?;
    let cache = Arc::new(
        ResultCache::new(db)
            .with_capacity(config.cache_capacity)
            .with_page_size(config.page_size),
    );

    let fetcher = Arc::new(TmdbClient::new(TmdbConfig::from_app_config(&config)?)?);
    let home = HomeFeed::new(fetcher.clone(), cache.clone(), config.home_categories.clone());
    let dispatcher = QueryDispatcher::spawn(
        fetcher,
        cache.clone(),
        Arc::new(FavoriteSet::new()),
        home,
        DispatcherConfig::from(&config),
    );

    let handler = handler::MarqueeServer::new(dispatcher, cache, config.home_categories.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
