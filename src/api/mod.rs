use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::proxy;
use crate::AppState;

pub mod handlers;

/// Build the full application router.
///
/// The query routes are served both under `/api` and at the root, matching
/// the routes the original service exposed; a single dispatcher backs all of
/// them.
pub fn app_router(state: Arc<AppState>) -> Router {
    let queries = proxy::handler::query_routes();

    let api = Router::new()
        .route("/login", post(handlers::login))
        .route("/change-password", post(handlers::change_password))
        .route("/status", get(handlers::status))
        .route("/cache/clear", post(handlers::clear_cache))
        .route("/cache/status", get(handlers::cache_status))
        .merge(queries.clone());

    Router::new()
        .nest("/api", api)
        .merge(queries)
        .fallback(fallback_404)
        .with_state(state)
}

async fn fallback_404() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "message": "endpoint not found",
                "type": "invalid_request_error",
                "code": "not_found",
            }
        })),
    )
}
