//! HTTP surface over the scrape job and its output file.

mod inspections;
mod scrape;

use std::path::PathBuf;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::job::ScrapeJob;
use crate::middleware::{
    assign_request_id, require_trigger_token, RequestId, TriggerAuth, REQUEST_ID_HEADER,
};

#[derive(Clone)]
pub struct AppState {
    pub job: ScrapeJob,
    /// Canonical JSON output written by the scraper.
    pub output_path: PathBuf,
}

/// Metadata carried by every JSON answer, success or failure.
#[derive(Debug, Serialize)]
pub struct Meta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<RequestId> for Meta {
    fn from(id: RequestId) -> Self {
        Self {
            request_id: id.0,
            timestamp: Utc::now(),
        }
    }
}

/// `{"data": ..., "meta": ...}` success body.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub meta: Meta,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(request_id: RequestId, data: T) -> Self {
        Self {
            data,
            meta: request_id.into(),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Failure answer, rendered as `{"error": {code, message}, "meta": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    request_id: RequestId,
}

impl ApiError {
    pub fn unauthorized(request_id: RequestId) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized",
            message: "missing or invalid bearer token".to_owned(),
            request_id,
        }
    }

    pub fn scrape_in_progress(request_id: RequestId) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            code: "already_running",
            message: "a scrape is already running".to_owned(),
            request_id,
        }
    }

    pub fn internal(request_id: RequestId, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
            request_id,
        }
    }
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
    meta: Meta,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let Self {
            status,
            code,
            message,
            request_id,
        } = self;
        let body = ErrorEnvelope {
            error: ErrorDetail { code, message },
            meta: request_id.into(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    scrape_running: bool,
}

/// Routes: reads are public, starting a scrape needs a trigger token.
pub fn build_app(state: AppState, auth: TriggerAuth) -> Router {
    let trigger = Router::new()
        .route("/api/v1/scrape", post(scrape::trigger_scrape))
        .route_layer(axum::middleware::from_fn_with_state(
            auth,
            require_trigger_token,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/inspections", get(inspections::list_inspections))
        .route("/api/v1/scrape/status", get(scrape::scrape_status))
        .merge(trigger)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors())
                .layer(axum::middleware::from_fn(assign_request_id)),
        )
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Envelope<HealthData> {
    Envelope::new(
        req_id,
        HealthData {
            status: "ok",
            scrape_running: state.job.is_running(),
        },
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
