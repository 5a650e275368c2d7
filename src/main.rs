use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use when2meet_server::config::Config;
use when2meet_server::routes::create_routes;
use when2meet_server::store::{EventStore, MemoryEventStore, PgEventStore, Store};
use when2meet_server::views::Views;
use when2meet_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("when2meet_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let backend: Arc<dyn EventStore> = match &config.database_url {
        Some(database_url) => {
            let store = PgEventStore::connect(database_url, config.max_connections)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Successfully connected to database");

            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Migrations run successfully");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory and lost on restart");
            Arc::new(MemoryEventStore::new())
        }
    };

    let shutdown = CancellationToken::new();
    let state = AppState {
        store: Store::new(backend, shutdown.clone(), config.store_timeout),
        views: Views::new().context("Failed to compile templates")?,
    };

    let app: Router = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind address")?;
    tracing::info!("Server running at http://{}", config.bind_addr);

    tokio::spawn(listen_for_shutdown(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("Server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Cancels `token` on ctrl-c or SIGTERM.
async fn listen_for_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Could not listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
    token.cancel();
}
