//! Timelytics Web - OTD prediction form server
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               TIMELYTICS WEB                 │
//! ├──────────────────────────────────────────────┤
//! │  GET  /         form + reference table       │
//! │  POST /predict  form → Predictor → page      │
//! │  GET  /health   liveness + model status      │
//! │                      │                       │
//! │                      ▼                       │
//! │        timelytics-core (ModelHandle)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use timelytics_core::Predictor;

pub use config::Config;
pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub config: Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::predict::index))
        .route("/predict", post(handlers::predict::submit))
        .route("/health", get(handlers::health::check))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
