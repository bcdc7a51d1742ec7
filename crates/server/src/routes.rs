use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{metrics::encode_metrics, types::Health};
use service::toko::TokoService;

use crate::openapi::ApiDoc;

pub mod toko;

/// Shared handler state. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub toko: Arc<TokoService>,
}

impl AppState {
    pub fn new(toko: TokoService) -> Self {
        Self { toko: Arc::new(toko) }
    }
}

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}

/// Build the full application router: store routes, health, metrics and API docs.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let toko_routes = Router::new()
        .route("/toko", get(toko::list).post(toko::create))
        .route("/toko/dekat", get(toko::nearby))
        .route("/toko/:index", get(toko::get).put(toko::update).delete(toko::delete));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(toko_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
