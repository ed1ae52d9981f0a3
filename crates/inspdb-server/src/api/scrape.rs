use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Serialize;

use super::{ApiError, AppState, Envelope};
use crate::job::JobStatus;
use crate::middleware::RequestId;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct TriggerData {
    status: &'static str,
}

/// Starts a background scrape and answers immediately.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    if !state.job.try_start("api") {
        return ApiError::scrape_in_progress(req_id).into_response();
    }
    (
        StatusCode::ACCEPTED,
        Envelope::new(req_id, TriggerData { status: "started" }),
    )
        .into_response()
}

pub(super) async fn scrape_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Envelope<JobStatus> {
    Envelope::new(req_id, state.job.status().await)
}
