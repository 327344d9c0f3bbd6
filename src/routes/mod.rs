use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{middleware::request_id, services::LeaderboardService};

pub mod leaderboards;

/// State shared by every handler
pub struct AppState {
    pub leaderboards: LeaderboardService,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(request_id::make_span_with_request_id),
                ),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/leaderboards/polls", get(leaderboards::polls))
        .route("/leaderboards/discussions", get(leaderboards::discussions))
        .route("/leaderboards/circles", get(leaderboards::circles))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
