//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{
    state::ApiState,
    types::{ControllerHealth, HealthResponse},
};

/// GET /api/v1/health
///
/// The process is healthy as long as it answers; `controller` reports
/// whether the last cycle reached the controller.
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let status = state.status.get().await;

    let controller = match status.connected {
        Some(true) => ControllerHealth::Up,
        Some(false) => ControllerHealth::Down,
        None => ControllerHealth::Unknown,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        controller,
        last_cycle: status.last_cycle,
        last_success: status.last_success_at.map(|t| t.to_rfc3339()),
        consecutive_failures: status.consecutive_failures,
        last_error: status.last_error,
    })
}
