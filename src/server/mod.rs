mod handlers;
mod state;

use axum::routing::{get, post};
use axum::Router;
use log::info;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::address::AddressResolver;

pub fn build_router(resolver: Arc<AddressResolver>) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/resolve", get(handlers::resolve_query).post(handlers::resolve_body))
        .route("/api/cities", get(handlers::city_list))
        .route("/api/gazetteer/refresh", post(handlers::refresh))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(resolver: Arc<AddressResolver>, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Waybill Locator server listening on http://{}", addr);
    axum::serve(listener, app).await
}
