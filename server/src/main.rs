//! Sweet Shop HTTP server.
//!
//! Wires configuration, storage, identity and the Axum router together, then
//! serves until SIGINT/SIGTERM.

mod config;
mod metrics;

use anyhow::Context;
use config::{Config, StorageBackend};
use metrics::MetricsServer;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use sweet_shop_auth::{AdminSeed, AuthConfig, IdentityService, InMemoryUserStore, UserStore};
use sweet_shop_core::environment::{Clock, SystemClock};
use sweet_shop_core::{Catalog, CatalogStore};
use sweet_shop_postgres::{PoolConfig, PostgresCatalogStore, PostgresUserStore};
use sweet_shop_testing::InMemoryCatalogStore;
use sweet_shop_web::{cors_layer, router, AppState};
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How often expired sessions are dropped from memory.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_LEVEL)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        backend = %config.storage.backend,
        port = config.server.port,
        metrics = config.metrics.enabled,
        "Starting Sweet Shop server"
    );

    if config.metrics.enabled {
        let addr = format!("{}:{}", config.metrics.host, config.metrics.port)
            .parse()
            .context("Invalid metrics address")?;
        MetricsServer::install(addr)?.spawn().await?;
    }

    let (store, users) = open_storage(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let session_ttl = chrono::Duration::from_std(config.auth.session_ttl)
        .context("AUTH_SESSION_TTL out of range")?;
    let identity = Arc::new(IdentityService::new(
        users,
        Arc::clone(&clock),
        AuthConfig::default().with_session_ttl(session_ttl),
    ));

    if let Some(admin) = &config.auth.admin {
        let profile = identity
            .seed_admin(AdminSeed {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
            })
            .await
            .context("Failed to seed admin account")?;
        info!(user_id = %profile.id, email = %profile.email, "Admin account ready");
    }

    spawn_session_purge(Arc::clone(&identity));

    let catalog = Arc::new(Catalog::new(store, clock));
    let app = router(AppState::new(catalog, identity))
        .layer(cors_layer(config.cors_allowed_origin.as_deref()));

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!(addr = %listener.local_addr()?, "Listening");

    let stop = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stop = Arc::clone(&stop);
        async move { stop.notified().await }
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => {
            joined.context("Server task panicked")??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    stop.notify_one();
    match tokio::time::timeout(config.server.shutdown_timeout, server).await {
        Ok(joined) => joined.context("Server task panicked")??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout.as_secs(),
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    info!("Server stopped");
    Ok(())
}

/// Build the catalog and user stores for the configured backend.
async fn open_storage(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogStore>, Arc<dyn UserStore>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            Ok((
                Arc::new(InMemoryCatalogStore::new()),
                Arc::new(InMemoryUserStore::new()),
            ))
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .context("DATABASE_URL is required")?;
            let pool = sweet_shop_postgres::connect(&PoolConfig {
                url,
                max_connections: config.storage.max_connections,
                min_connections: config.storage.min_connections,
                connect_timeout: config.storage.connect_timeout,
            })
            .await?;
            sweet_shop_postgres::migrate(&pool).await?;
            info!("Database connected and migrated");
            Ok((
                Arc::new(PostgresCatalogStore::new(pool.clone())),
                Arc::new(PostgresUserStore::new(pool)),
            ))
        }
    }
}

/// Periodically drop expired bearer sessions.
fn spawn_session_purge(identity: Arc<IdentityService>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = identity.purge_expired_sessions();
            if purged > 0 {
                info!(purged, "Expired sessions purged");
            }
        }
    });
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
