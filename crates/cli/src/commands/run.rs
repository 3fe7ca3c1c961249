//! `react-agent run`: Answer a single message.

use std::sync::Arc;

use react_agent_agent::AgentLoop;
use react_agent_config::AppConfig;
use react_agent_core::message::{ConversationState, Role};

pub async fn run(
    config: AppConfig,
    message: String,
    max_iterations: Option<u32>,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = react_agent_providers::build_from_config(&config.provider)?;
    let tools = Arc::new(react_agent_tools::default_registry(&config.tools));

    let mut agent = AgentLoop::from_settings(provider, tools, &config.agent);
    if let Some(max) = max_iterations {
        agent = agent.with_max_iterations(max);
    }
    if let Some(model) = model {
        agent = agent.with_model(model);
    }

    eprint!("  Thinking...");
    let result = agent.run(ConversationState::from_user(message)).await;
    eprint!("\r              \r");
    let state = result?;
    tracing::debug!(
        entries = state.len(),
        tool_calls = state.tool_call_count(),
        "Run finished"
    );

    for entry in state.messages.iter().filter(|m| m.role == Role::Tool) {
        let name = entry.name.as_deref().unwrap_or("tool");
        eprintln!("  [{name}] {}", entry.content.lines().next().unwrap_or_default());
    }
    println!("{}", state.final_answer().unwrap_or_default());
    Ok(())
}
