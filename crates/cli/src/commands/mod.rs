pub mod config_cmd;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};

use react_agent_config::AppConfig;

/// `$HOME` (or `%USERPROFILE%` on Windows).
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// The config file to read: `explicit`, else `~/.react-agent/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| home_dir().map(|home| AppConfig::default_path(&home)))
}

/// Load the config file and apply environment overrides, once per process.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match config_path(explicit) {
        Some(path) => AppConfig::load_from(&path)
            .map_err(|e| format!("Failed to load config: {e}"))?,
        None => AppConfig::default(),
    };
    let config = config
        .apply_env(|key| std::env::var(key).ok())
        .map_err(|e| format!("Invalid environment override: {e}"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = config_path(Some(Path::new("/etc/react-agent.toml")));
        assert_eq!(path, Some(PathBuf::from("/etc/react-agent.toml")));
    }

    #[test]
    fn missing_explicit_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.agent.max_iterations, 25);
    }
}
