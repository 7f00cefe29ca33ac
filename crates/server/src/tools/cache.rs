//! cache_* tool implementations.
//!
//! `cache_get` reads one cached entry by query text; `cache_clear` empties
//! the result cache.

use marquee_core::{CacheEntry, Error, QueryDispatcher, ResultCache, ResultStore};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Query text or `home:<category>` key. Matched case-insensitively.
    pub query: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheGetOutput {
    pub entry: CacheEntry,
    pub has_more_pages: bool,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearOutput {
    /// Number of entries removed.
    pub deleted: u64,
}

pub async fn get_impl(cache: &ResultCache, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let entry = cache
        .get_results(&params.query)
        .await?
        .ok_or_else(|| Error::CacheMiss(params.query.clone()))?;

    let has_more_pages = entry.has_more_pages();
    json_result(&CacheGetOutput { entry, has_more_pages })
}

pub async fn clear_impl(dispatcher: &QueryDispatcher) -> Result<CallToolResult, McpError> {
    let deleted = dispatcher.clear_cache().await?;

    tracing::info!(deleted, "result cache cleared");
    json_result(&CacheClearOutput { deleted })
}
