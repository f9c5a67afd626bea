use crate::state::AppState;
use crate::{exposition, health, relay};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub fn router(state: Arc<AppState>) -> Router {
    // Any origin, with credentials: the origin is mirrored back rather than `*`.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|_, _| true))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(exposition::metrics_handler))
        .route("/api/prometheus/query", get(relay::query_handler))
        .route("/api/prometheus/query_range", get(relay::query_range_handler))
        .route("/api/metrics/summary", get(relay::summary_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "WinIT Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
