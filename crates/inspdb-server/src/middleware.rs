//! Request tagging and scrape-trigger authorization.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied ids longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one API call, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Keeps the caller's `x-request-id` when it is short printable ASCII,
    /// otherwise mints a UUID.
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id.chars().all(|c| c.is_ascii_graphic())
            });
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }
}

/// Tags the request with a [`RequestId`] and echoes it on the response.
pub async fn assign_request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let echo = HeaderValue::from_str(&id.0).ok();
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;
    if let Some(value) = echo {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Bearer tokens allowed to start a scrape. With no tokens the trigger is
/// open, which only development permits.
#[derive(Debug, Clone)]
pub struct TriggerAuth {
    tokens: Arc<[String]>,
}

impl TriggerAuth {
    /// Parses the comma-separated `INSPDB_API_KEYS` value.
    ///
    /// # Errors
    ///
    /// No usable token outside development.
    pub fn from_keys(raw: Option<&str>, is_development: bool) -> anyhow::Result<Self> {
        let tokens: Vec<String> = raw
            .into_iter()
            .flat_map(|raw| raw.split(','))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if tokens.is_empty() {
            anyhow::ensure!(
                is_development,
                "INSPDB_API_KEYS must name at least one trigger token outside development"
            );
        }

        Ok(Self {
            tokens: tokens.into(),
        })
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.tokens.is_empty()
    }

    fn admits(&self, headers: &HeaderMap) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(presented) = bearer_token(headers) else {
            return false;
        };
        // Every token is compared; no early exit on a match.
        self.tokens.iter().fold(false, |matched, token| {
            matched | bool::from(token.as_bytes().ct_eq(presented.as_bytes()))
        })
    }
}

/// Rejects trigger calls without an accepted bearer token. The 401 uses
/// the regular error envelope so the caller still gets its request id.
pub async fn require_trigger_token(
    State(auth): State<TriggerAuth>,
    req: Request,
    next: Next,
) -> Response {
    if auth.admits(req.headers()) {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(|| RequestId::from_headers(req.headers()));
    tracing::warn!(request_id = %request_id.0, "scrape trigger rejected");
    ApiError::unauthorized(request_id).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
