//! API error taxonomy.
//!
//! Every failure a handler can produce maps onto one of these variants, and
//! every variant renders the same `{ success: false, message }` JSON shape
//! the frontend expects. Unknown errors are logged and their detail is
//! suppressed outside debug builds.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::common::validation::FieldError;
use crate::domains::auth::actions::OtpVerifyError;
use crate::domains::auth::TokenError;
use crate::kernel::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input - 400.
    #[error("{0}")]
    Validation(String),

    /// Field-level validation failures - 400 with an `errors` list.
    #[error("Validation errors occurred")]
    ValidationDetailed(Vec<FieldError>),

    /// Missing or bad credential/token - 401.
    #[error("{0}")]
    Auth(String),

    /// Authenticated but not allowed - 403.
    #[error("{0}")]
    Forbidden(String),

    /// Missing entity or challenge - 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique field - 409.
    #[error("{0}")]
    Conflict(String),

    /// Fixed-window limiter tripped - 429.
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: u64 },

    /// Downstream transport failed - 500 with a stable user-facing message.
    #[error("{0}")]
    Delivery(String),

    /// Anything else - 500, detail suppressed outside debug builds.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::ValidationDetailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Delivery(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{:#}", e), "Unhandled server error");
                if cfg!(debug_assertions) {
                    format!("{:#}", e)
                } else {
                    "Internal server error".to_string()
                }
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });

        if let ApiError::ValidationDetailed(errors) = &self {
            body["errors"] = serde_json::to_value(errors).unwrap_or_default();
        }
        if let ApiError::RateLimited { retry_after } = &self {
            body["retryAfter"] = json!(retry_after);
        }

        (status, Json(body)).into_response()
    }
}

impl From<FieldError> for ApiError {
    fn from(e: FieldError) -> Self {
        ApiError::Validation(e.message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => {
                ApiError::Conflict(format!("A user with this {} already exists", field))
            }
            StoreError::Unavailable(detail) => {
                ApiError::Internal(anyhow::anyhow!("Storage unavailable: {}", detail))
            }
            StoreError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError::Auth(e.to_string())
    }
}

impl From<OtpVerifyError> for ApiError {
    fn from(e: OtpVerifyError) -> Self {
        match e {
            OtpVerifyError::ChallengeNotFound => ApiError::NotFound(e.to_string()),
            OtpVerifyError::Expired
            | OtpVerifyError::AttemptsExhausted
            | OtpVerifyError::Mismatch { .. } => ApiError::Validation(e.to_string()),
            OtpVerifyError::Store(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// `Json` wrapper whose rejection renders the standard error envelope
/// instead of axum's plain-text default.
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);
