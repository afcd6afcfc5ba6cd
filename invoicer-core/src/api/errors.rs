use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::LedgerError;

/// Errors returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    /// Malformed query parameters.
    BadRequest(String),
    /// Body or path that could not be decoded at all.
    Unprocessable(String),
}

impl ApiError {
    pub fn invalid_body(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::Unprocessable("invoice body not valid".to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Ledger(err) => {
                let status = match &err {
                    LedgerError::Validation(_)
                    | LedgerError::InvalidDueDate(_)
                    | LedgerError::Overpayment { .. } => StatusCode::BAD_REQUEST,
                    LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                    LedgerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if let LedgerError::Persistence(msg) = &err {
                    error!("Store failure: {}", msg);
                    return json_error(status, err.code(), "invoice storage error");
                }
                json_error(status, err.code(), err.to_string())
            }
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unprocessable(msg) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "detail": detail.into(),
        })),
    )
        .into_response()
}
