//! # HTTP Surface
//!
//! | Route                  | Purpose                                   |
//! |------------------------|-------------------------------------------|
//! | `GET /`                | health probe                              |
//! | `POST /uploads`        | multipart upload, answers with image URL  |
//! | `GET /static/uploads`  | raw uploads as stored                     |
//! | `GET /static/generated`| generated artifacts                       |

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    error::Result,
    pipeline::TransformEngine,
    storage::{GENERATED_ROUTE, UPLOADS_ROUTE},
};

pub use error::ApiError;

/// State shared by every request handler
pub struct AppState {
    pub engine: TransformEngine,
    public_url: Option<String>,
    port: u16,
}

impl AppState {
    pub fn new(engine: TransformEngine, config: &ServerConfig) -> Self {
        Self {
            engine,
            public_url: config.public_url.clone(),
            port: config.port,
        }
    }

    /// Origin used to build artifact URLs for a request
    ///
    /// The configured public URL wins, then the request's Host header, then
    /// `localhost` on the bound port.
    pub fn base_url(&self, host: Option<&str>) -> String {
        match (&self.public_url, host) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(host)) => format!("http://{}", host),
            (None, None) => format!("http://localhost:{}", self.port),
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let uploads = ServeDir::new(state.engine.store().upload_dir());
    let generated = ServeDir::new(state.engine.store().generated_dir());

    Router::new()
        .route("/", get(handlers::health))
        .route("/uploads", post(handlers::upload))
        .nest_service(UPLOADS_ROUTE, uploads)
        .nest_service(GENERATED_ROUTE, generated)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until Ctrl-C
pub async fn serve(state: Arc<AppState>, config: &ServerConfig) -> Result<()> {
    let app = router(state, config);
    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;

    info!("🚀 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested, draining in-flight requests"),
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
