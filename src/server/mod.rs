//! JSON API over the zone and dedup operations.

mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::ingest::Ingestor;
use crate::store::JsonStore;

pub fn build_router(store: JsonStore, ingestor: Ingestor) -> Router {
    let state = Arc::new(AppState {
        store: Mutex::new(store),
        ingestor,
    });

    Router::new()
        .route("/api/geohash", get(handlers::geohash))
        .route("/api/distance", get(handlers::distance))
        .route("/api/match", get(handlers::find_match))
        .route("/api/points", axum::routing::post(handlers::ingest_point))
        .route("/api/points/{id}", get(handlers::get_point))
        .route("/api/zones", get(handlers::zone_list))
        .route("/api/zones/{slug}", get(handlers::zone_detail))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, store: JsonStore, ingestor: Ingestor) -> anyhow::Result<()> {
    let store_path = store.path().display().to_string();
    let app = build_router(store, ingestor);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot bind to {}: {}", addr, e))?;

    info!(%addr, store = %store_path, "dobity API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
