//! Axum HTTP surface over the workflow execution engine (spec §6).
//!
//! Out of scope per the spec: authentication, persistence. This crate is
//! an "external collaborator" wrapper — the hard engineering lives in
//! `weave-core`; this just exposes it over HTTP.

pub mod routes;
pub mod state;

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

/// Bind and serve the HTTP surface until the process is interrupted.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!(%addr, "weave-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
