pub mod agent_core;
pub mod config;
pub mod executors;
pub mod inference;
pub mod server;
pub mod store;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use agent_core::{Orchestrator, OrchestratorConfig, CATALOG_VERSION};
use config::{AppConfig, LoggingConfig, StoreBackend};
use inference::InferenceClient;
use server::auth::{GoTrueResolver, IdentityResolver, StaticTokenResolver};
use server::AppState;
use store::{PostgrestProvider, SharedStore, SqliteStore, StoreProvider};

/// Return the platform-standard data directory for Biz.
///
/// - macOS: `~/Library/Application Support/biz-agent/`
/// - Windows: `{FOLDERID_RoamingAppData}\biz-agent\`
/// - Linux: `$XDG_DATA_HOME/biz-agent/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.biz-agent/` only if none of the above can be resolved.
pub(crate) fn data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("biz-agent");
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".biz-agent")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Call once, before [`run`].
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Build the adapters named in `config` and serve until Ctrl-C.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen,
        store = ?config.store.backend,
        catalog_version = CATALOG_VERSION,
        data_dir = %data_dir().display(),
        "=== Biz agent starting ==="
    );

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")?;

    tracing::info!("=== Biz agent stopped ===");
    Ok(())
}

fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let model = InferenceClient::from_config(&config.model).context("failed to build model client")?;
    let store_timeout = Duration::from_secs(config.store.timeout_secs);

    let (stores, identity): (Arc<dyn StoreProvider>, Arc<dyn IdentityResolver>) = match config.store.backend {
        StoreBackend::Postgrest => {
            let provider = PostgrestProvider::new(&config.store.endpoint, config.store.public_key(), store_timeout)
                .context("failed to build store client")?;
            let resolver = GoTrueResolver::new(&config.store.endpoint, config.store.public_key(), store_timeout)
                .context("failed to build auth client")?;
            let stores: Arc<dyn StoreProvider> = Arc::new(provider);
            let identity: Arc<dyn IdentityResolver> = Arc::new(resolver);
            (stores, identity)
        }
        StoreBackend::Sqlite => {
            let path = config.store.resolved_sqlite_path();
            if let Some(parent) = std::path::Path::new(&path).parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let store = SqliteStore::open(&path).with_context(|| format!("failed to open {path}"))?;
            tracing::info!(path = %path, "using embedded SQLite store");
            let stores: Arc<dyn StoreProvider> = Arc::new(SharedStore(Arc::new(store)));
            let identity: Arc<dyn IdentityResolver> =
                Arc::new(StaticTokenResolver::new(&config.auth.static_tokens));
            (stores, identity)
        }
    };

    let orchestrator = Orchestrator::new(Arc::new(model), OrchestratorConfig::from_app(config));
    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        identity,
        stores,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
