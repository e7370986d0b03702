use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};

use common::types::Health;

use crate::metrics;
use crate::state::AppState;

pub mod cart;
pub mod pages;

/// Liveness plus a backend ping.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    match state.carts.ping().await {
        Ok(()) => (StatusCode::OK, Json(Health::ok())),
        Err(e) => {
            warn!(error = %e, "health check: backend unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Health::unavailable()))
        }
    }
}

async fn prometheus_metrics() -> (StatusCode, String) {
    metrics::encode_metrics()
}

/// Build the full application router.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    metrics::init();

    Router::new()
        .route("/", get(pages::index))
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .route("/cart/all", get(cart::get_all_carts))
        .route("/cart/items/:user_id", get(cart::get_cart_items))
        .route("/cart/item/:user_id", get(cart::add_item).post(cart::add_item))
        .route("/cart/total/:user_id", get(cart::cart_total))
        .route("/cart/clear/:user_id", get(pages::clear_cart))
        .route("/order/:user_id", get(pages::order))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and friends
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
