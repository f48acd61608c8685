use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes and layers
///
/// The request-id middleware sits outermost so the trace span can pick the
/// id out of the request extensions.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dialog/start", post(handlers::start_dialog))
        .route("/dialog/choose", post(handlers::choose))
        .route("/recommendations", post(handlers::recommendations))
        .route("/feedback", post(handlers::feedback))
        .route("/users/:user_id", get(handlers::user_profile))
        .route("/users/:user_id/history", get(handlers::user_history))
        .route("/catalog", get(handlers::catalog))
        .route("/catalog/:id", get(handlers::content_by_id))
}
