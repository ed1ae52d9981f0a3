use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};

use super::{ApiError, AppState};
use crate::middleware::RequestId;

/// Serves the canonical output file as-is. Before the first scrape there is
/// no file and the answer is an empty array.
pub(super) async fn list_inspections(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Response {
    match tokio::fs::read(&state.output_path).await {
        Ok(body) => json_body(body),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => json_body(b"[]".to_vec()),
        Err(e) => {
            tracing::error!(
                path = %state.output_path.display(),
                error = %e,
                "failed to read inspections output"
            );
            ApiError::internal(req_id, "failed to read inspections").into_response()
        }
    }
}

fn json_body(body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}
