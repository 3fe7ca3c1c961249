//! `react-agent config`: Show the effective configuration.

use std::path::Path;

use react_agent_config::AppConfig;

pub fn show(config: &AppConfig, explicit: Option<&Path>) {
    match super::config_path(explicit) {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file (defaults)"),
    }
    println!("{}", config.to_redacted_toml());
}
