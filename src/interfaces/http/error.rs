use crate::error::BankError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Error returned by HTTP handlers, rendered as `{ "code": ..., "message": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        let message = err.to_string();
        let (status, code) = match &err {
            BankError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BankError::InsufficientFunds(_) => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            BankError::BelowMinimumAmount(_) => (StatusCode::BAD_REQUEST, "BELOW_MINIMUM_AMOUNT"),
            BankError::NonPositiveAmount => (StatusCode::BAD_REQUEST, "NON_POSITIVE_AMOUNT"),
            BankError::MissingAccount(_) => (StatusCode::BAD_REQUEST, "MISSING_ACCOUNT"),
            BankError::MissingDestination => (StatusCode::BAD_REQUEST, "MISSING_DESTINATION"),
            BankError::SameAccount => (StatusCode::BAD_REQUEST, "SAME_ACCOUNT"),
            BankError::ReceivedNotAllowed => (StatusCode::BAD_REQUEST, "RECEIVED_NOT_ALLOWED"),
            BankError::UnknownAccount(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_ACCOUNT"),
            BankError::BalanceLimitExceeded(_) => {
                (StatusCode::BAD_REQUEST, "BALANCE_LIMIT_EXCEEDED")
            }
            BankError::InvalidCredentials => (StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS"),
            BankError::Conflict(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            BankError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            BankError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            BankError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            _ => {
                tracing::error!(error = %err, "Internal server error");
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "An internal error occurred",
                );
            }
        };
        Self::new(status, code, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
