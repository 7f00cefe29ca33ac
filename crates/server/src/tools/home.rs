//! home_sections tool implementation.
//!
//! Loads any category section not loaded yet and returns all sections.

use marquee_core::{HomeSections, QueryDispatcher};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use super::json_result;

/// Output from the home_sections tool.
#[derive(Debug, Clone, Serialize)]
pub struct HomeSectionsOutput {
    #[serde(flatten)]
    pub sections: HomeSections,
    /// Configured categories that have nothing to show.
    pub missing: Vec<String>,
}

pub async fn home_sections_impl(dispatcher: &QueryDispatcher, categories: &[String]) -> Result<CallToolResult, McpError> {
    let mut home = dispatcher.subscribe_home();
    home.mark_unchanged();
    dispatcher.load_home_content()?;

    if home.changed().await.is_err() {
        return Err(marquee_core::Error::DispatcherClosed.into());
    }

    let sections = home.borrow_and_update().clone();
    let missing = categories.iter().filter(|c| !sections.is_loaded(c)).cloned().collect();

    json_result(&HomeSectionsOutput { sections, missing })
}
