//! Channel snapshot endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{ChannelResponse, ChannelsResponse},
};

/// GET /api/v1/channels
pub async fn list_channels(State(state): State<ApiState>) -> Json<ChannelsResponse> {
    let channels: Vec<ChannelResponse> = state
        .read_model
        .snapshot()
        .await
        .into_iter()
        .map(ChannelResponse::from)
        .collect();

    Json(ChannelsResponse {
        count: channels.len(),
        channels,
    })
}

/// GET /api/v1/channels/{name}
pub async fn get_channel(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ChannelResponse>> {
    let snapshot = state
        .read_model
        .channel(&name)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("unknown channel '{name}'")))?;

    Ok(Json(snapshot.into()))
}
