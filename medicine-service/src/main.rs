use std::sync::Arc;

use anyhow::Context;
use common_observability::MetricsRegistry;
use medicine_service::config::{load_service_config, StoreBackend};
use medicine_service::{
    build_jwt_verifier, build_router, AppState, InMemoryMedicineStore, MedicineMetrics, PgMedicineStore,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_service_config()?;
    let registry = Arc::new(MetricsRegistry::new());
    let metrics = Arc::new(
        MedicineMetrics::new(registry, config.status_label).context("failed to register service metrics")?,
    );
    let jwt_verifier = Arc::new(build_jwt_verifier(&config.jwt)?);

    let state = match config.store {
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().context("DATABASE_URL must be set")?;
            let db = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            if config.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("failed to run database migrations")?;
            }
            AppState::new(PgMedicineStore::new(db), jwt_verifier, metrics)
        }
        StoreBackend::Memory => {
            warn!("MEDICINE_STORE=memory; data is lost on restart");
            AppState::new(InMemoryMedicineStore::new(), jwt_verifier, metrics)
        }
    };

    let app = build_router(state, &config.http);
    let addr = config.socket_addr();
    info!(%addr, metrics_path = %config.http.metrics_path, "starting medicine-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "failed to listen for Ctrl+C");
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
                warn!(%err, "failed to install SIGTERM handler");
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
    info!("signal received, starting graceful shutdown");
}
