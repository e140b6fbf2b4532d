use std::sync::Arc;

use anyhow::Context;

use janapada::app::{AppState, build_router};
use janapada::config::AppConfig;
use janapada::email::EmailDispatcher;
use janapada::registration::{FixedCodeVerifier, RegistrationManager, SimulatedGateway};
use janapada::store::{KeyValueStore, LibSqlStore, Preferences};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let addr = config.socket_addr()?;

    // ── Preferences ─────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = match &config.prefs_db {
        Some(path) => Arc::new(
            LibSqlStore::new_local(path)
                .await
                .with_context(|| format!("Failed to open preference store at {}", path.display()))?,
        ),
        None => Arc::new(LibSqlStore::new_memory().await?),
    };
    store.init().await?;
    let preferences = Preferences::new(Arc::clone(&store));

    // ── Email ───────────────────────────────────────────────────────────
    let dispatcher = Arc::new(EmailDispatcher::new(&config.email));
    if dispatcher.is_development() {
        tracing::warn!("No email provider configured; confirmations are logged, not sent");
    }

    // ── Registration ────────────────────────────────────────────────────
    let manager = Arc::new(RegistrationManager::new(
        config.wizard.clone(),
        Arc::new(FixedCodeVerifier::default()),
        Arc::new(SimulatedGateway),
        Arc::clone(&dispatcher),
    ));
    let pruner = manager.spawn_pruner();

    let app = build_router(AppState {
        manager,
        dispatcher,
        preferences,
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "JANAPADA registration server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    pruner.abort();
    store.teardown().await?;
    Ok(())
}
