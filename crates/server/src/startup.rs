use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, AppState};
use service::{
    storage,
    toko::{TokoCollection, TokoService},
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    addr.parse().with_context(|| format!("invalid bind address {addr}"))
}

/// Load the backing document and wire the service state. A load failure is
/// returned as-is: the process has nothing to serve without the initial data.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store = storage::from_config(&cfg.storage)?;
    let source = store.describe();
    let collection = TokoCollection::load(store, cfg.storage.timeout())
        .await
        .with_context(|| format!("loading store collection from {source}"))?;
    let toko = TokoService::with_radius(Arc::new(collection), cfg.nearby.radius_km);
    Ok(AppState::new(toko))
}

pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    info!("received Ctrl+C, shutting down");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app = build_app(state);

    let addr = bind_addr(&cfg)?;
    info!(%addr, radius_km = cfg.nearby.radius_km, "starting toko api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
