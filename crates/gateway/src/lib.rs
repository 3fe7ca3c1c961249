//! HTTP entry point for react-agent.
//!
//! Two route families share one agent:
//!
//! - `/langgraph/*` exposes the loop over the conversation-state shape
//!   (run to completion, stream, or drive it step by step)
//! - `/openai/*` speaks the OpenAI chat-completions dialect so existing
//!   clients can talk to the agent
//!
//! `/openapi.json` describes both, and `/docs` serves Swagger UI over it.
//!
//! Built on Axum.

pub mod error;
pub mod langgraph;
pub mod openai;
pub mod openapi;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use utoipa::ToSchema;

use react_agent_agent::AgentLoop;
use react_agent_config::{AppConfig, ToolsConfig};
use react_agent_core::provider::Provider;
use react_agent_core::tool::ToolRegistry;

pub use error::{ApiError, ErrorResponse};

/// Shared application state for the gateway.
pub struct GatewayState {
    /// Agent configured from the `[agent]` section; requests derive their
    /// own copy with per-request overrides applied.
    pub agent: AgentLoop,

    /// The `[tools]` section, for requests that adjust the built-in tools
    pub tools: ToolsConfig,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(agent: AgentLoop, tools: ToolsConfig) -> SharedState {
        Arc::new(Self { agent, tools })
    }

    /// The agent for one request.
    pub fn agent_for(&self, overrides: &RunOverrides) -> AgentLoop {
        overrides.apply(self.agent.clone(), &self.tools)
    }
}

/// Per-request settings that take precedence over the configured ones.
///
/// Requests can narrow the server's limits but never widen them:
/// `max_iterations` and `max_search_results` are capped at the configured
/// values, and `enable_web_search` cannot turn on a disabled tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RunOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_matching: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_web_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_search_results: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
}

impl RunOverrides {
    /// Tool settings for this request, or `None` when it changes none.
    pub fn tools_config(&self, base: &ToolsConfig) -> Option<ToolsConfig> {
        if self.enable_web_search.is_none()
            && self.max_search_results.is_none()
            && self.include_domains.is_none()
        {
            return None;
        }
        let mut config = base.clone();
        if let Some(enabled) = self.enable_web_search {
            config.enable_web_search &= enabled;
        }
        if let Some(max) = self.max_search_results {
            config.max_search_results = max.clamp(1, base.max_search_results);
        }
        if let Some(domains) = &self.include_domains {
            config.include_domains = domains.clone();
        }
        Some(config)
    }

    /// Apply to `agent`. Tool settings rebuild the built-in registry.
    pub fn apply(&self, mut agent: AgentLoop, tools: &ToolsConfig) -> AgentLoop {
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            agent = agent.with_model(model);
        }
        if let Some(prompt) = self.system_prompt.as_deref().filter(|p| !p.is_empty()) {
            agent = agent.with_system_prompt(prompt);
        }
        if let Some(tool_only) = self.tool_only {
            agent = agent.with_tool_only(tool_only);
        }
        if let Some(tool_matching) = self.tool_matching {
            agent = agent.with_tool_matching(tool_matching);
        }
        if let Some(max) = self.max_iterations {
            let cap = agent.max_iterations();
            agent = agent.with_max_iterations(max.min(cap));
        }
        if let Some(config) = self.tools_config(tools) {
            let registry = react_agent_tools::default_registry(&config);
            agent = agent.with_tools(Arc::new(registry));
        }
        agent
    }
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (1 MB)
/// - CORS for browser clients
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .nest("/langgraph", langgraph::router(state.clone()))
        .nest("/openai", openai::router(state))
        .merge(openapi::docs())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and serve until Ctrl-C.
pub async fn start(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let agent = AgentLoop::from_settings(provider, tools, &config.agent);
    let app = build_router(GatewayState::new(agent, config.tools.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, model = %config.agent.model, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
}
