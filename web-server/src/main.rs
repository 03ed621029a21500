//! Timelytics form server
//!
//! Loads the model once, then serves the prediction page until interrupted.
//! A model that fails to load stops the process before it binds.

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timelytics_core::constants::{APP_NAME, APP_VERSION};
use timelytics_core::logic::model::handle;
use timelytics_core::Predictor;
use timelytics_web::{create_router, AppState, Config};

const DEFAULT_LOG_FILTER: &str = "timelytics_web=debug,timelytics_core=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    init_tracing(&config);

    tracing::info!("{} v{} starting...", APP_NAME, APP_VERSION);
    tracing::info!("Model artifact: {}", config.model_path);
    if config.is_production() && config.model_sha256.is_none() {
        tracing::warn!("MODEL_SHA256 is not set; relying on the sidecar checksum if present");
    }

    let model = handle::init(&config.model_path, config.model_sha256.as_deref())
        .map_err(|e| {
            tracing::error!("Failed to load model: {}", e);
            e
        })
        .with_context(|| format!("cannot start without a model ({})", config.model_path))?;

    tracing::info!(
        "Model '{}' ready ({}, layout v{})",
        model.metadata().name,
        model.metadata().kind,
        model.metadata().layout.version
    );

    let state = AppState {
        predictor: Predictor::new(model),
        config: config.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Shutting down");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
