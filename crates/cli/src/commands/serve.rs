//! `react-agent serve`: Start the HTTP server.

use std::sync::Arc;

use react_agent_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    model: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(model) = model {
        config.agent.model = model;
    }

    let provider = react_agent_providers::build_from_config(&config.provider)?;
    let tools = Arc::new(react_agent_tools::default_registry(&config.tools));

    println!("react-agent gateway");
    println!("   Listening: http://{}:{}", config.server.host, config.server.port);
    println!("   Provider:  {} ({})", config.provider.name, config.provider.api_url);
    println!("   Model:     {}", config.agent.model);
    println!("   Tools:     {}", tools.names().join(", "));

    react_agent_gateway::start(&config, provider, tools).await?;
    Ok(())
}
