//! react-agent CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP server
//! - `run`: Answer a single message and exit
//! - `config`: Show the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "react-agent",
    about = "react-agent: a tool-calling ReAct agent",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Config file (defaults to ~/.react-agent/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send a single message and print the agent's answer
    Run {
        #[arg(short, long)]
        message: String,

        /// Override the configured reasoning-step cap
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },

    /// Print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port, model } => {
            commands::serve::run(config, host, port, model).await?
        }
        Commands::Run {
            message,
            max_iterations,
            model,
        } => commands::run::run(config, message, max_iterations, model).await?,
        Commands::Config => commands::config_cmd::show(&config, cli.config.as_deref()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "react-agent",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Serve { host, port, model } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
                assert!(model.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn run_requires_message() {
        assert!(Cli::try_parse_from(["react-agent", "run"]).is_err());

        let cli = Cli::try_parse_from([
            "react-agent",
            "--config",
            "/tmp/agent.toml",
            "run",
            "-m",
            "What is 2+2?",
            "--max-iterations",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/agent.toml")));
        match cli.command {
            Commands::Run {
                message,
                max_iterations,
                ..
            } => {
                assert_eq!(message, "What is 2+2?");
                assert_eq!(max_iterations, Some(3));
            }
            _ => panic!("expected run"),
        }
    }
}
