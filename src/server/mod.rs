//! HTTP server
//!
//! Routes:
//! - `POST /upload` multipart upload plus index build
//! - `GET /models` model names
//! - `POST /rag` question answering
//! - `POST /finetune/{model_name}` fine-tune acknowledgement
//! - `GET /health` liveness

mod error;
pub mod handlers;

use crate::config::{Config, ServerConfig};
use crate::error::{Error, Result};
use crate::namespace::NamespaceStore;
use crate::pipeline::RagPipeline;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub namespaces: NamespaceStore,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        let namespaces = pipeline.namespaces().clone();
        Self {
            pipeline,
            namespaces,
        }
    }
}

/// Build the application router
pub fn router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let origin = HeaderValue::from_str(&config.frontend_origin).map_err(|e| {
        Error::Config(format!(
            "Invalid frontend origin '{}': {}",
            config.frontend_origin, e
        ))
    })?;

    let cors = CorsLayer::new()
        .allow_origin(origin.clone())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Ok(Router::new()
        .route("/upload", post(handlers::upload))
        .route("/models", get(handlers::list_models))
        .route("/rag", post(handlers::rag))
        .route("/finetune/{model_name}", post(handlers::finetune))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            origin,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Run the HTTP server until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let pipeline = Arc::new(RagPipeline::from_config(config)?);
    let state = AppState::new(pipeline);
    state.namespaces.ensure_root().await?;

    let app = router(state, &config.server)?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        "Serving on http://{} (uploads in {})",
        listener.local_addr()?,
        config.uploads_root().display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
