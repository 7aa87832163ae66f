//! Token command - Print a signed bearer token

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use sublink_auth::TokenIssuer;
use sublink_config::Config;

/// Token command arguments
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Username to put in the token
    pub username: String,

    /// Lifetime in seconds (defaults to auth.jwt_expires_in)
    #[arg(long)]
    pub expires_in_secs: Option<u64>,
}

/// Run the token command
pub fn run(args: TokenArgs, config: &Config) -> Result<()> {
    config
        .auth
        .validate()
        .context("invalid [auth] configuration")?;

    let secret = config
        .auth
        .jwt_secret_bytes()
        .context("auth.jwt_secret is required")?;

    let lifetime = args
        .expires_in_secs
        .map(Duration::from_secs)
        .unwrap_or(config.auth.jwt_expires_in);

    if !config.auth.users.iter().any(|u| u.username == args.username) {
        eprintln!(
            "warning: '{}' is not in [[auth.users]], the token will authenticate but cannot manage API keys",
            args.username
        );
    }

    let token = TokenIssuer::new(secret, lifetime)
        .issue(&args.username)
        .context("failed to sign token")?;

    println!("{}", token);
    Ok(())
}
