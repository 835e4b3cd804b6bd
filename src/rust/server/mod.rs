//! HTTP surface: routing, shared state and error rendering.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

mod error;
pub mod handlers;

pub use error::ApiError;
pub use handlers::HealthResponse;

use crate::classifier::Classifier;

/// State shared by every request handler. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub status: Arc<str>,
}

impl AppState {
    pub fn new(classifier: Classifier, status: impl Into<Arc<str>>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            status: status.into(),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/classify", post(handlers::classify))
        .route("/api/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves when the process receives Ctrl-C (or SIGTERM on Unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
