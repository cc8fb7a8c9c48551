use std::net::SocketAddr;

use keyward_auth_api::{build_router, AppState, Config, LogFormat};
use keyward_db::pg::Repositories;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_tracing(config.log_format)?;

    tracing::info!("Starting Keyward Auth API");
    tracing::info!(
        http_port = config.http_port,
        issuer = %config.auth.issuer,
        access_ttl_secs = config.auth.access_token_ttl.as_secs(),
        refresh_ttl_secs = config.auth.refresh_token_ttl.as_secs(),
        "Configuration loaded"
    );

    // Signing keys; a bad pair stops startup here
    let keys = config.load_keys()?;
    tracing::info!("Signing keys loaded");

    let state = match &config.database_url {
        Some(url) => {
            let pool = keyward_db::create_pool(url).await?;
            tracing::info!("Database pool created");
            if config.run_migrations {
                keyward_db::run_migrations(&pool).await?;
                tracing::info!("Migrations applied");
            }
            AppState::postgres(config.auth.clone(), keys, Repositories::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; sessions are kept in memory");
            AppState::in_memory(config.auth.clone(), keys)
        }
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("keyward_auth_api=debug".parse()?);

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
