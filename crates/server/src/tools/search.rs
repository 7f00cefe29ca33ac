//! search_* tool implementations.
//!
//! Thin wrappers over the query dispatcher. Every tool returns the session
//! snapshot; the ones that dispatch a fetch wait for it to settle first.

use marquee_core::QueryDispatcher;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the search_set_query tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetQueryParams {
    /// Current contents of the search box. Blank text clears the search.
    pub text: String,
}

/// Parameters for the search_submit tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitParams {
    /// Search query (required).
    pub query: String,
}

/// Parameters for the search_load_more tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoadMoreParams {
    /// Id of the last result currently visible.
    pub last_visible_id: i64,
}

/// Record typed text; the search runs after the debounce interval.
pub async fn set_query_impl(dispatcher: &QueryDispatcher, params: SetQueryParams) -> Result<CallToolResult, McpError> {
    dispatcher.set_query_text(params.text)?;
    json_result(&dispatcher.snapshot())
}

pub async fn submit_impl(dispatcher: &QueryDispatcher, params: SubmitParams) -> Result<CallToolResult, McpError> {
    dispatcher.search(&params.query)?;
    json_result(&dispatcher.settled().await?)
}

pub async fn load_more_impl(dispatcher: &QueryDispatcher, params: LoadMoreParams) -> Result<CallToolResult, McpError> {
    dispatcher.load_more_if_needed(params.last_visible_id)?;
    json_result(&dispatcher.settled().await?)
}

pub async fn retry_impl(dispatcher: &QueryDispatcher) -> Result<CallToolResult, McpError> {
    dispatcher.retry()?;
    json_result(&dispatcher.settled().await?)
}

pub async fn snapshot_impl(dispatcher: &QueryDispatcher) -> Result<CallToolResult, McpError> {
    json_result(&dispatcher.snapshot())
}
