//! Built-in tool implementations for react-agent.
//!
//! Tools give the agent the ability to act: do arithmetic and search the
//! web. Hosts add their own through [`typed::typed_tool`], which turns a
//! plain async function over a serde-deserializable argument struct into a
//! registered [`Tool`](react_agent_core::Tool).

pub mod calculator;
pub mod typed;
pub mod web_search;

use react_agent_config::ToolsConfig;
use react_agent_core::tool::ToolRegistry;

pub use calculator::CalculatorTool;
pub use typed::{FnTool, typed_tool};
pub use web_search::WebSearchTool;

/// Create a tool registry with the built-in tools enabled in `config`.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    if config.enable_calculator {
        registry.register(Box::new(CalculatorTool));
    }
    if config.enable_web_search {
        registry.register(Box::new(WebSearchTool::from_config(config)));
    }
    tracing::debug!(tools = ?registry.names(), "Loaded {} tools", registry.len());
    registry
}
