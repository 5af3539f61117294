//! Poll and alert control endpoints

use axum::{Json, extract::State};
use tracing::info;

use crate::actors::alert::MAX_MUTE_SECS;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{MuteRequest, MuteResponse, PollResponse},
};

/// POST /api/v1/poll
///
/// Runs a cycle immediately and returns its outcome.
pub async fn trigger_poll(State(state): State<ApiState>) -> ApiResult<Json<PollResponse>> {
    info!("poll requested through API");

    let report = state
        .collector
        .poll_now()
        .await
        .map_err(|e| ApiError::Unavailable(format!("{e:#}")))?;

    Ok(Json(PollResponse::from(report.as_ref())))
}

/// POST /api/v1/alerts/mute
pub async fn mute_alerts(
    State(state): State<ApiState>,
    Json(request): Json<MuteRequest>,
) -> ApiResult<Json<MuteResponse>> {
    if request.duration_secs == 0 || request.duration_secs > MAX_MUTE_SECS {
        return Err(ApiError::InvalidRequest(format!(
            "duration_secs must be between 1 and {MAX_MUTE_SECS}"
        )));
    }

    state.alerts.mute_alerts(request.duration_secs).await;
    muted(&state).await
}

/// POST /api/v1/alerts/unmute
pub async fn unmute_alerts(State(state): State<ApiState>) -> ApiResult<Json<MuteResponse>> {
    state.alerts.unmute_alerts().await;
    muted(&state).await
}

async fn muted(state: &ApiState) -> ApiResult<Json<MuteResponse>> {
    let muted = state
        .alerts
        .is_muted()
        .await
        .ok_or_else(|| ApiError::Unavailable("alert actor is not running".to_string()))?;

    Ok(Json(MuteResponse { muted }))
}
