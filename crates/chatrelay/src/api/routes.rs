//! API route definitions.

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::{Json, Router, routing::get};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::ws::ws_handler;

use super::page;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Result<Router> {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let cors_origin = state.settings.cors_origin.clone();

    let mut app = Router::new()
        .route("/", get(page::viewer_page))
        .route("/ws", get(ws_handler))
        .route("/health", get(route_health))
        .layer(trace_layer)
        .with_state(state);

    if !cors_origin.is_empty() {
        let cors = CorsLayer::new()
            .allow_origin([HeaderValue::from_str(&cors_origin)?])
            .allow_methods([Method::GET])
            .allow_headers(Any);

        app = app.layer(cors);
    }

    Ok(app)
}

async fn route_health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
