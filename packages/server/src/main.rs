use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemUploadStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::services::payment::{ChapaGateway, DisabledGateway, PaymentGateway};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("failed to connect to the database")?;
    info!("Database ready");

    let uploads = FilesystemUploadStore::new(config.uploads.dir.clone(), config.uploads.max_file_size)
        .await
        .context("failed to prepare the upload directory")?;

    let payments: Arc<dyn PaymentGateway> = if config.payment.enabled {
        info!(base_url = %config.payment.base_url, "Online payment enabled");
        Arc::new(ChapaGateway::new(reqwest::Client::new(), &config.payment))
    } else {
        info!("Online payment disabled");
        Arc::new(DisabledGateway)
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    let state = AppState {
        db: db.clone(),
        config: Arc::new(config),
        uploads: Arc::new(uploads),
        payments,
    };
    let app = server::build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .context("failed to bind TCP listener")?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    db.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
}
