use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting GodPlan API in {:?} mode", config.environment);
    if !config.is_production() {
        // Secrets are skipped by the Serialize impl
        tracing::debug!("Resolved configuration: {}", serde_json::to_string(&config)?);
    }

    let database = config.database()?;
    let db = DatabaseManager::connect(database).await?;
    if database.auto_migrate {
        db.migrate().await?;
    }

    let bind_addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    tracing::info!(
        radius_meters = config.attendance.radius_meters,
        location_check = config.attendance.enable_location_check,
        "GodPlan API listening on http://{}",
        bind_addr
    );

    let router = app(AppState::new(config, db.clone()));
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db.close().await;
    served?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received, draining connections");
}
