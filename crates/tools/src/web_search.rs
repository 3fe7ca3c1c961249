//! Web search tool backed by the Tavily search API.
//!
//! Without an API key the tool still registers, but every call fails with a
//! recoverable error so the model can answer without search.

use async_trait::async_trait;
use react_agent_config::ToolsConfig;
use react_agent_core::error::ToolError;
use react_agent_core::tool::{Tool, ToolResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SEARCH_TIMEOUT_SECS: u64 = 30;

pub struct WebSearchTool {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    max_results: u32,
    include_domains: Vec<String>,
}

impl WebSearchTool {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, max_results: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            max_results: max_results.max(1),
            include_domains: Vec::new(),
        }
    }

    /// Restrict every search to `domains`, whatever the model asks for.
    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = domains;
        self
    }

    /// Configured domains win over the ones the model asks for.
    fn domains<'a>(&'a self, requested: &'a [String]) -> &'a [String] {
        if self.include_domains.is_empty() {
            requested
        } else {
            &self.include_domains
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            config.search_api_url.clone(),
            config.search_api_key.clone(),
            config.max_search_results,
        )
        .with_include_domains(config.include_domains.clone())
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Option<u32>,
    #[serde(default)]
    include_domains: Vec<String>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    #[serde(skip_serializing_if = "no_domains")]
    include_domains: &'a [String],
}

fn no_domains(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Render hits as a numbered plain-text list the model can cite from.
fn format_results(query: &str, response: &SearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results found for '{query}'.");
    }
    let mut out = String::new();
    if let Some(answer) = response.answer.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(&format!("Answer: {answer}\n\n"));
    }
    for (i, hit) in response.results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   {}\n   {}\n",
            i + 1,
            hit.title,
            hit.url,
            hit.content.trim()
        ));
    }
    out.trim_end().to_string()
}

fn failure(reason: impl Into<String>) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: "web_search".into(),
        reason: reason.into(),
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns relevant results with titles, URLs and content snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": format!("Number of results to return (at most {})", self.max_results)
                },
                "include_domains": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Restrict results to these domains"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: SearchArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.query.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'query' must not be empty".into()));
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| failure("web search is not configured (missing search API key)"))?;

        let max_results = args
            .max_results
            .unwrap_or(self.max_results)
            .clamp(1, self.max_results);
        let body = SearchRequest {
            query: &args.query,
            max_results,
            include_domains: self.domains(&args.include_domains),
        };

        tracing::debug!(query = %args.query, max_results, "Searching the web");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolError::Timeout {
                        tool_name: "web_search".into(),
                        timeout_ms: SEARCH_TIMEOUT_SECS * 1000,
                    }
                } else {
                    failure(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(failure(format!("search API returned {status}: {text}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("invalid search response: {e}")))?;

        let mut result = ToolResult::ok(format_results(&args.query, &parsed));
        result.data = serde_json::to_value(&parsed.results).ok();
        Ok(result)
    }
}
