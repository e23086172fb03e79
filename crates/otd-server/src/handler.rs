use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use otd_bank::{Namespace, Redemption};
use serde::Serialize;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Path segment that selects ISSUE instead of REDEEM.
pub const GENERATE_ACTION: &str = "generate_code";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check handler.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.is_ready() { "ok" } else { "misconfigured" },
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `/{namespace}/generate_code` issues a code; `/{namespace}/{code}` redeems one.
///
/// Segments that do not percent-decode to UTF-8 are treated as an unknown route.
pub async fn code_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ServerResult<Response> {
    let Path((namespace, action)) =
        path.map_err(|rejection| ServerError::RouteNotFound(rejection.body_text()))?;
    let namespace = Namespace::parse(&namespace)?;

    if action == GENERATE_ACTION {
        let code = state
            .run(move |lifecycle| lifecycle.issue_code(&namespace))
            .await?;
        return Ok((StatusCode::OK, code.into_string()).into_response());
    }

    let outcome = state
        .run(move |lifecycle| lifecycle.redeem_code(&namespace, &action))
        .await?;
    Ok(redemption_response(outcome))
}

/// Wire form of a redemption outcome.
pub fn redemption_response(outcome: Redemption) -> Response {
    let (status, body) = match outcome {
        Redemption::Valid => (StatusCode::CREATED, "Valid download code."),
        Redemption::Expired => (StatusCode::METHOD_NOT_ALLOWED, "Expired download code."),
        Redemption::Invalid => (StatusCode::FORBIDDEN, "Invalid download code."),
    };
    (status, body).into_response()
}

/// Fallback for any path that is not `/{namespace}/{action}`.
pub async fn not_found_handler(uri: Uri) -> ServerError {
    ServerError::RouteNotFound(uri.path().to_string())
}
