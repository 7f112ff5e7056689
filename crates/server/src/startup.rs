use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use service::prestation::SeaOrmPrestationRepository;
use tokio::net::TcpListener;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, ServerState};

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Connect the database, apply migrations when enabled and assemble the router.
pub async fn build_app(config: AppConfig) -> Result<Router, StartupError> {
    let db = models::db::connect_with_config(&config.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if config.database.auto_migrate {
        migration::Migrator::up(&db, None)
            .await
            .map_err(|e| StartupError::Database(format!("migrations: {e}")))?;
        info!(event = "migrations_applied", "database schema up to date");
    }

    let repo = Arc::new(SeaOrmPrestationRepository { db });
    Ok(routes::build_router(ServerState::new(repo, config)))
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_until<F>(config: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = bind_addr(&config)?;
    let project = config.api.project_name.clone();
    let prefix = config.api.prefix.clone();
    let app = build_app(config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.to_string(), source })?;
    info!(%addr, project = %project, prefix = %prefix, event = "listening", "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!(event = "drained", "http server stopped accepting connections");
    Ok(())
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    run_until(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
