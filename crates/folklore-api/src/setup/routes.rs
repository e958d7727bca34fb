//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use folklore_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Multipart framing overhead allowed on top of the configured payload cap.
/// The per-part size limits are enforced in the services.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        .route("/responses", post(handlers::responses::submit_response))
        .route(
            "/responses/{id}/transcribe",
            post(handlers::responses::retrigger_response),
        )
        .route(
            "/responses/{id}/status",
            get(handlers::responses::response_status),
        )
        .route(
            "/stories/{story_id}/responses",
            get(handlers::responses::list_story_responses),
        )
        .route("/diary/upload", post(handlers::diary::upload_diary))
        .route("/diary/{upload_id}/ocr", post(handlers::diary::trigger_ocr))
        .route(
            "/diary/{upload_id}/status",
            get(handlers::diary::diary_status),
        )
        .route(
            "/diary/{upload_id}/create-story",
            post(handlers::diary::create_story),
        )
        .with_state(state);

    // A diary upload carries up to MAX_DIARY_PAGES parts, each individually
    // capped by the services; the body limit bounds the whole request.
    let body_limit = config.max_upload_size_bytes * folklore_core::models::MAX_DIARY_PAGES
        + MULTIPART_OVERHEAD_BYTES;

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/openapi.json", get(openapi_json))
        .nest(API_PREFIX, api)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.unwrap_or_default())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
