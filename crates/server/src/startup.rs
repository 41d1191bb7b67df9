use std::future::Future;

use axum::Router;
use chrono::Duration;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use configs::AppConfig;
use service::auth::AuthConfig;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

pub fn auth_config(cfg: &AppConfig) -> AuthConfig {
    AuthConfig::new(cfg.auth.jwt_secret.clone()).with_session_ttl(Duration::hours(cfg.auth.session_ttl_hours))
}

/// Connect to Postgres, apply pending migrations and assemble handler state.
pub async fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    if cfg.auth.uses_dev_secret() {
        warn!("JWT_SECRET not set; using the development secret");
    }
    Ok(ServerState::with_db(db, auth_config(cfg), cfg.auth.cookie_secure))
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Bind and serve until `shutdown` resolves.
pub async fn serve(cfg: AppConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("server stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}
