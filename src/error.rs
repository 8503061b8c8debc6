use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The error taxonomy from the API contract. Each variant maps to exactly
/// one HTTP status; handlers return these instead of raw status codes so
/// the envelope and logging stay centralized.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("internal error")]
    Internal(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldViolation {
            field: field.into(),
            message: message.into(),
        }])
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "notFound",
            AppError::Conflict(_) => "conflict",
            AppError::PayloadTooLarge => "payloadTooLarge",
            AppError::RateLimited { .. } => "rateLimited",
            AppError::Internal(_) | AppError::Config(_) | AppError::Db(_) => "internal",
            AppError::Unavailable(_) => "unavailable",
            AppError::Timeout => "timeout",
        }
    }

    /// Message safe to leak to the client. 5xx errors never leak their cause.
    fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) | AppError::Config(_) | AppError::Db(_) => {
                "an internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: &'static str,
    message: String,
    #[serde(rename = "statusCode")]
    status_code: u16,
    #[serde(rename = "requestId")]
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldViolation>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let request_id = crate::http::request_id::current();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, error = %self, "request failed");
        } else {
            tracing::warn!(request_id = %request_id, error = %self, "request rejected");
        }

        let details = match &self {
            AppError::Validation(v) => Some(v.clone()),
            _ => None,
        };
        let retry_after = match &self {
            AppError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorEnvelope {
            error: self.kind(),
            message: self.public_message(),
            status_code: status.as_u16(),
            request_id,
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after
            && let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string())
        {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }
        response
    }
}
