//! Configuration loading, validation, and management for react-agent.
//!
//! Loads configuration from `~/.react-agent/config.toml`. Environment
//! overrides are applied through an explicit lookup function so that the
//! libraries never read process-wide state on their own: the binary reads
//! the environment once at startup and hands the result down.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default system prompt. `{system_time}` is replaced with the current
/// UTC time on every reasoning step.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the available tools when they help you answer accurately, and answer \
directly when they do not.\n\nSystem time: {system_time}";

/// The root configuration structure.
///
/// Maps directly to `~/.react-agent/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Agent loop behaviour
    #[serde(default)]
    pub agent: AgentSettings,

    /// Model provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Built-in tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model name sent to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// System prompt template
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum reasoning steps per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Refuse questions no registered tool can help with
    #[serde(default)]
    pub tool_only: bool,

    /// Ask the model to pre-select relevant tools before reasoning
    #[serde(default)]
    pub tool_matching: bool,

    /// Per-call tool time limit; unset means no limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_timeout_secs: Option<u64>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_iterations() -> u32 {
    25
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: None,
            max_iterations: default_max_iterations(),
            tool_only: false,
            tool_matching: false,
            tool_timeout_secs: None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name of the provider
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_api_url(),
            api_key: None,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub enable_calculator: bool,

    #[serde(default = "default_true")]
    pub enable_web_search: bool,

    /// Maximum results returned per web search
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,

    /// Tavily-compatible search endpoint
    #[serde(default = "default_search_api_url")]
    pub search_api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    /// Restrict every search to these domains
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_domains: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_max_search_results() -> u32 {
    10
}
fn default_search_api_url() -> String {
    "https://api.tavily.com/search".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enable_calculator: true,
            enable_web_search: true,
            max_search_results: default_max_search_results(),
            search_api_url: default_search_api_url(),
            search_api_key: None,
            include_domains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8888
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl std::fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("enable_calculator", &self.enable_calculator)
            .field("enable_web_search", &self.enable_web_search)
            .field("max_search_results", &self.max_search_results)
            .field("search_api_url", &self.search_api_url)
            .field("search_api_key", &redact(&self.search_api_key))
            .field("include_domains", &self.include_domains)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a specific file path.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognized keys:
    /// - `REACT_AGENT_API_KEY`, then `OPENAI_API_KEY` (only if no key is configured)
    /// - `REACT_AGENT_API_URL`
    /// - `REACT_AGENT_MODEL`
    /// - `TAVILY_API_KEY` (only if no search key is configured)
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.provider.api_key.is_none() {
            self.provider.api_key =
                lookup("REACT_AGENT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(url) = lookup("REACT_AGENT_API_URL") {
            self.provider.api_url = url;
        }
        if let Some(model) = lookup("REACT_AGENT_MODEL") {
            self.agent.model = model;
        }
        if self.tools.search_api_key.is_none() {
            self.tools.search_api_key = lookup("TAVILY_API_KEY");
        }
        self.validate()?;
        Ok(self)
    }

    /// Get the configuration directory path (`$HOME/.react-agent`).
    pub fn config_dir(home: &Path) -> PathBuf {
        home.join(".react-agent")
    }

    /// Default config file path under `home`.
    pub fn default_path(home: &Path) -> PathBuf {
        Self::config_dir(home).join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.model must not be empty".into(),
            ));
        }
        if self.agent.tool_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.tool_timeout_secs must be at least 1".into(),
            ));
        }
        if self.tools.max_search_results == 0 {
            return Err(ConfigError::ValidationError(
                "tools.max_search_results must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Render as TOML with secrets replaced, for display.
    pub fn to_redacted_toml(&self) -> String {
        let mut shown = self.clone();
        if shown.provider.api_key.is_some() {
            shown.provider.api_key = Some("[REDACTED]".into());
        }
        if shown.tools.search_api_key.is_some() {
            shown.tools.search_api_key = Some("[REDACTED]".into());
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.agent.max_iterations, 25);
        assert_eq!(config.tools.max_search_results, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tool_timeout_is_optional_and_positive() {
        let config: AppConfig = toml::from_str("[agent]\ntool_timeout_secs = 20").unwrap();
        assert_eq!(config.agent.tool_timeout_secs, Some(20));
        assert!(config.validate().is_ok());
        assert_eq!(AppConfig::default().agent.tool_timeout_secs, None);

        let mut config = AppConfig::default();
        config.agent.tool_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[agent]\nmodel = \"deepseek-chat\"\nmax_iterations = 5\ntool_only = true\n\n[server]\nport = 9000"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.agent.model, "deepseek-chat");
        assert_eq!(config.agent.max_iterations, 5);
        assert!(config.agent.tool_only);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.tools.enable_calculator);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nmodel = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_fill_missing_keys() {
        let config = AppConfig::default()
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-openai"),
                ("REACT_AGENT_MODEL", "deepseek-chat"),
                ("TAVILY_API_KEY", "tvly-1"),
            ]))
            .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.agent.model, "deepseek-chat");
        assert_eq!(config.tools.search_api_key.as_deref(), Some("tvly-1"));
    }

    #[test]
    fn env_does_not_replace_configured_key() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("from-file".into());
        let config = config
            .apply_env(env(&[("REACT_AGENT_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn secrets_are_redacted() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".into());
        config.tools.search_api_key = Some("tvly-secret".into());
        assert!(!format!("{config:?}").contains("secret"));
        assert!(!config.to_redacted_toml().contains("secret"));
        assert!(config.to_redacted_toml().contains("[REDACTED]"));
    }
}
