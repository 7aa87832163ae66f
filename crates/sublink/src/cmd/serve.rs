//! Serve command - Run the Sublink API server

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use sublink_api::{AppState, AuthSettings, build_router};
use sublink_auth::{CredentialCache, CredentialStore, MemoryKeyStore, User, UserDirectory};
use sublink_config::{API_KEY_SECRET_ENV, Config};

/// Run the server until SIGINT or SIGTERM
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "Sublink starting"
    );

    config
        .auth
        .validate()
        .context("invalid [auth] configuration")?;

    let jwt_secret = config
        .auth
        .jwt_secret_bytes()
        .context("auth.jwt_secret is required")?;

    let api_key_secret = config.auth.resolved_api_key_secret();
    if api_key_secret.is_none() {
        warn!(
            env = API_KEY_SECRET_ENV,
            "no API key secret configured, API key requests will be rejected"
        );
    }

    let store: Arc<dyn CredentialStore> = Arc::new(MemoryKeyStore::new());
    let (cache, sweeper) = CredentialCache::with_sweeper(config.auth.cache_ttl);

    let users = UserDirectory::from_users(config.auth.users.iter().map(|u| User {
        id: u.id,
        username: u.username.clone(),
    }));
    if users.is_empty() {
        warn!("no users configured, API keys cannot be issued");
    }

    let state = AppState::build(
        AuthSettings {
            jwt_secret,
            api_key_secret: api_key_secret.as_deref().map(str::as_bytes),
        },
        store,
        Arc::new(cache),
        Arc::new(users),
    );

    let app = build_router(state);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %addr,
        cache_ttl = ?config.auth.cache_ttl,
        users = config.auth.users.len(),
        "API server listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await;

    // Stop the sweeper whether or not serving failed
    sweeper.shutdown().await;

    if let Err(e) = served {
        error!(error = %e, "server error");
        return Err(e).context("API server failed");
    }

    info!("Sublink shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, stopping server...");
}
