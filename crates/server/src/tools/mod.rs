//! MCP tool implementations.
//!
//! This module contains all tools exposed by the marquee server.

pub mod cache;
pub mod home;
pub mod search;

pub use cache::CacheGetParams;
pub use search::{LoadMoreParams, SetQueryParams, SubmitParams};

use marquee_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Serialize `output` as the pretty-printed text content of a successful result.
pub(crate) fn json_result(output: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
