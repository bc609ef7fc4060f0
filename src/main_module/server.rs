//! HTTP server initialization and routing

use axum::{routing::get, Router};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::llm::configure_chat_routes;
use crate::tickets::configure_tickets_routes;

use super::{health_check, shutdown_signal};

pub fn build_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(ApiUrls::HEALTH, get(health_check))
        .merge(configure_tickets_routes())
        .merge(configure_chat_routes())
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;
    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid listen address {}:{}: {}", host, port, e),
        )
    })?;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
