//! Read-only REST API over the live sample store.
//!
//! Provides three GET endpoints:
//! - `/metrics` - aggregate metrics for the current history
//! - `/rows` - per-sample derived rows with optional index range filtering
//! - `/report` - the plain-text audit report

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::{info, warn};

use crate::audit::refresh::ShareControl;
use crate::audit::types::Tariff;
use crate::config::ReportConfig;
use crate::store::SampleStore;

/// Application state shared across all request handlers.
///
/// Every request re-reads the store, so responses follow the producer
/// without any caching.
pub struct AppState {
    /// Store read on each request.
    pub store: SampleStore,
    /// Constants passed to the metrics engine.
    pub tariff: Tariff,
    /// Share used when a request does not name one.
    pub share: ShareControl,
    /// Report title and footer.
    pub report: ReportConfig,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::get_metrics))
        .route("/rows", get(handlers::get_rows))
        .route("/report", get(handlers::get_report))
        .with_state(state)
}

/// Binds to the given address and serves the API until Ctrl-C.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
}
