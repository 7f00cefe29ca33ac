//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::{
    CacheGetParams, LoadMoreParams, SetQueryParams, SubmitParams, cache, home::home_sections_impl, search,
};

use marquee_core::{QueryDispatcher, ResultCache};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;

/// The main MCP server handler for marquee.
#[derive(Clone)]
pub struct MarqueeServer {
    tool_router: ToolRouter<Self>,
    dispatcher: QueryDispatcher,
    cache: Arc<ResultCache>,
    categories: Arc<[String]>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl MarqueeServer {
    pub fn new(dispatcher: QueryDispatcher, cache: Arc<ResultCache>, categories: Vec<String>) -> Self {
        Self { tool_router: Self::tool_router(), dispatcher, cache, categories: categories.into() }
    }

    #[tool(
        description = "Update the search box text. A search runs once the text stops changing for the debounce interval; blank text clears the search. Returns the current session snapshot."
    )]
    async fn search_set_query(&self, params: Parameters<SetQueryParams>) -> Result<CallToolResult, McpError> {
        search::set_query_impl(&self.dispatcher, params.0).await
    }

    #[tool(description = "Search movies immediately and wait for the first page. Returns the session snapshot.")]
    async fn search_submit(&self, params: Parameters<SubmitParams>) -> Result<CallToolResult, McpError> {
        search::submit_impl(&self.dispatcher, params.0).await
    }

    #[tool(
        description = "Report the last visible result id. Loads the next page when it is near the end of the list and more pages exist."
    )]
    async fn search_load_more(&self, params: Parameters<LoadMoreParams>) -> Result<CallToolResult, McpError> {
        search::load_more_impl(&self.dispatcher, params.0).await
    }

    #[tool(description = "Re-run the current search from page 1, or reload the home sections when there is no search.")]
    async fn search_retry(&self) -> Result<CallToolResult, McpError> {
        search::retry_impl(&self.dispatcher).await
    }

    #[tool(description = "Return the current search session snapshot without changing anything.")]
    async fn search_snapshot(&self) -> Result<CallToolResult, McpError> {
        search::snapshot_impl(&self.dispatcher).await
    }

    #[tool(description = "Load the home category sections (now playing, popular, ...), falling back to cached copies.")]
    async fn home_sections(&self) -> Result<CallToolResult, McpError> {
        home_sections_impl(&self.dispatcher, &self.categories).await
    }

    #[tool(description = "Read the cached results for a query or a home:<category> key.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        cache::get_impl(&self.cache, params.0).await
    }

    #[tool(description = "Remove every cached result entry.")]
    async fn cache_clear(&self) -> Result<CallToolResult, McpError> {
        cache::clear_impl(&self.dispatcher).await
    }
}

impl ServerHandler for MarqueeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "marquee".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::setup;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let (dispatcher, cache) = setup().await;
        let server = MarqueeServer::new(dispatcher, cache, vec!["popular".into()]);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_clear",
                "cache_get",
                "home_sections",
                "search_load_more",
                "search_retry",
                "search_set_query",
                "search_snapshot",
                "search_submit",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let (dispatcher, cache) = setup().await;
        let server = MarqueeServer::new(dispatcher, cache, Vec::new());
        assert_eq!(server.get_info().server_info.name, "marquee");
    }
}
