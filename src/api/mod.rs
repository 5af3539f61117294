//! Read-only HTTP query surface plus a few control endpoints
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Snapshot read model** for channel data, never blocking the poll loop
//! - **Actor handles** for triggering polls and muting alerts
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check with controller status
//! - `GET /api/v1/channels` - All channel snapshots
//! - `GET /api/v1/channels/{name}` - One channel snapshot
//! - `GET /api/v1/report?title=` - Plain-text report
//! - `POST /api/v1/poll` - Run a poll cycle now
//! - `POST /api/v1/alerts/mute` - Mute alert notifications
//! - `POST /api/v1/alerts/unmute` - Unmute alert notifications

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::{ApiState, ControllerStatusStore};
pub use types::{ChannelResponse, ChannelsResponse, HealthResponse, PollResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::info;

use crate::config::ApiSettings;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Optional bearer token
    pub auth_token: Option<String>,

    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiSettings::default().into()
    }
}

impl From<ApiSettings> for ApiConfig {
    fn from(settings: ApiSettings) -> Self {
        Self {
            bind_addr: settings.bind,
            auth_token: settings.token,
            enable_cors: settings.enable_cors,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/channels", get(routes::channels::list_channels))
        .route("/api/v1/channels/:name", get(routes::channels::get_channel))
        .route("/api/v1/report", get(routes::report::get_report))
        .route("/api/v1/poll", post(routes::control::trigger_poll))
        .route("/api/v1/alerts/mute", post(routes::control::mute_alerts))
        .route("/api/v1/alerts/unmute", post(routes::control::unmute_alerts))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// Starts the server in a background task and returns its local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use anyhow::Context;
    use tower_http::cors::{Any, CorsLayer};

    info!("starting API server on {}", config.bind_addr);

    let mut app = router(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    if let Some(token) = config.auth_token {
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
