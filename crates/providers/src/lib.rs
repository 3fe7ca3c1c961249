//! LLM provider implementations for react-agent.
//!
//! All providers implement the `react_agent_core::Provider` trait.
//! [`build_from_config`] turns the `[provider]` config section into one.

pub mod openai_compat;

use std::sync::Arc;

use react_agent_config::ProviderConfig;
use react_agent_core::error::ProviderError;
use react_agent_core::provider::Provider;

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no API key is available; local
/// endpoints that need no key can set any placeholder value.
pub fn build_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "no API key for provider '{}' (set REACT_AGENT_API_KEY or provider.api_key)",
            config.name
        ))
    })?;
    let provider = OpenAiCompatProvider::new(&config.name, &config.api_url, api_key)?;
    Ok(Arc::new(provider))
}
