use std::time::Duration;

use axum::Router;
use configs::AppConfig;
use service::cart::CartStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Connect the backend (fail-fast) and optionally load the seed fixture.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    let backend = service::backend::connect(&cfg.backend)
        .await
        .map_err(StartupError::Backend)?;
    let carts = CartStore::new(backend, Duration::from_millis(cfg.backend.lock_timeout_ms));

    if cfg.seed.on_startup {
        warn!("seed.on_startup is set; existing carts will be replaced");
        carts.reset_with_seed_data().await.map_err(StartupError::Seed)?;
    } else {
        info!("seed on startup disabled; keeping stored carts");
    }
    Ok(AppState::new(carts))
}

/// Build the router around an already constructed state.
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let listener = TcpListener::bind((cfg.server.host.as_str(), cfg.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "cart service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
