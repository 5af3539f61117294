//! On-demand report endpoint

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::api::{state::ApiState, types::ReportQuery};

/// GET /api/v1/report?title=...
///
/// Same text the scheduled reports send, rendered from the current snapshots.
pub async fn get_report(
    State(state): State<ApiState>,
    Query(query): Query<ReportQuery>,
) -> impl IntoResponse {
    let title = query
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| state.report_title.clone());

    let text = state.read_model.generate_report(&title).await;

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text)
}
