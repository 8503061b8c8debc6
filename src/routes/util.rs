//! Shared helpers reused by every route module: garde→`AppError` conversion
//! and the `If-Unmodified-Since` optimistic-concurrency header.

use axum::http::HeaderMap;

use crate::error::{AppError, FieldViolation};

/// Runs a `garde::Validate` value and converts any violations into the
/// `AppError::Validation` taxonomy entry, preserving field paths.
pub fn validate<T: garde::Validate<Context = ()>>(value: &T) -> Result<(), AppError> {
    value.validate(&()).map_err(|report| {
        let violations = report
            .iter()
            .map(|(path, error)| FieldViolation {
                field: path.to_string(),
                message: error.to_string(),
            })
            .collect();
        AppError::Validation(violations)
    })
}

/// Parses the `If-Unmodified-Since` header as a millisecond epoch
/// timestamp, the form every client in this API sends it in — not an
/// HTTP-date, since the server hands the client back its own `updatedAt`
/// integer to echo.
pub fn if_unmodified_since(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("if-unmodified-since")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
