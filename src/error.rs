use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::IdentityError;
use crate::orchestration::CommissionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Database error");
        AppError::Internal("internal error".to_string())
    }
}

impl From<CommissionError> for AppError {
    fn from(err: CommissionError) -> Self {
        match err {
            CommissionError::NotAPartner(_) => {
                AppError::Forbidden("only partner accounts can request payouts".to_string())
            }
            CommissionError::NoEligibleSales => AppError::BadRequest(
                "no eligible sales: sales must be at least 15 days old".to_string(),
            ),
            CommissionError::RequestNotFound(id) => {
                AppError::NotFound(format!("commission request {} not found", id))
            }
            CommissionError::SaleTransitionConflict { .. } | CommissionError::Store(_) => {
                // Full detail stays server-side; the caller sees an opaque failure.
                tracing::error!(error = %err, "Commission operation failed");
                AppError::Internal("internal error".to_string())
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredential => {
                AppError::Unauthorized("invalid credential".to_string())
            }
            other => {
                tracing::error!(error = %other, "Identity service error");
                AppError::Internal("internal error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
