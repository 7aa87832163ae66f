//! Sublink - Subscription link service
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! sublink
//! sublink --config configs/config.toml
//!
//! # Print a bearer token for a user
//! sublink token alice
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sublink_config::{Config, LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sublink - Subscription link service
#[derive(Parser, Debug)]
#[command(name = "sublink")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true, env = "SUBLINK_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve,

    /// Print a signed bearer token for a user
    Token(cmd::token::TokenArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Token(args)) => {
            // Token output goes to stdout, no logging
            cmd::token::run(args, &config)
        }
        // No subcommand = run server (default behavior)
        Some(Command::Serve) | None => {
            init_logging(cli.log_level.as_deref(), &config)?;
            cmd::serve::run(config).await
        }
    }
}

/// Initialize the tracing subscriber
///
/// Level: CLI flag > `RUST_LOG` > config file.
fn init_logging(cli_level: Option<&str>, config: &Config) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{}': {}", level, e))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.log.filter_directive()))
            .or_else(|_| EnvFilter::try_new(LogLevel::Info.as_str()))
            .map_err(|e| anyhow::anyhow!("invalid log filter: {}", e))?,
    };

    match config.log.format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_current_span(false))
            .with(filter)
            .init(),
    }

    Ok(())
}
