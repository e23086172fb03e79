use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use otd_bank::BankError;
use thiserror::Error;

/// Body returned with every 404.
pub const NOT_FOUND_BODY: &str = "Not found";

/// Body returned with every 503. Internal detail only goes to the logs.
pub const INTERNAL_FAILURE_BODY: &str = "Internal failure.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("code bank error: {0}")]
    Bank(#[from] BankError),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The status callers see for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RouteNotFound(_) => StatusCode::NOT_FOUND,
            Self::Bank(e) if e.is_client_error() => StatusCode::NOT_FOUND,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::NOT_FOUND {
            tracing::info!(error = %self, "unrecognized request");
            (status, NOT_FOUND_BODY).into_response()
        } else {
            tracing::error!(error = %self, "request failed");
            (status, INTERNAL_FAILURE_BODY).into_response()
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
