//! Dashboard — Axum web server exposing the pool over HTTP.
//!
//! Serves read-only queries plus the three engine operations as a JSON
//! API. Transport only: every semantic decision stays in the engine.
//! CORS enabled for local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::{AppState, DashboardState};

/// Start the dashboard web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Read-only queries
        .route("/api/status", get(routes::get_status))
        .route("/api/totals", get(routes::get_totals))
        .route("/health", get(routes::health))
        // Stake ledger: query and placement
        .route("/api/stakes", get(routes::get_stakes).post(routes::place_stake))
        // Admin operations
        .route("/api/announce", post(routes::announce))
        .route("/api/withdraw", post(routes::withdraw))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
