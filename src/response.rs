//! The `{data: T}` success envelope every 2xx response carries.
//! Errors are enveloped separately by `AppError`'s `IntoResponse` impl.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

/// Wraps a serializable value as a 200 `{data: ...}` response.
pub struct Data<T>(pub T);

impl<T: Serialize> IntoResponse for Data<T> {
    fn into_response(self) -> Response {
        Json(Envelope { data: self.0 }).into_response()
    }
}

/// Wraps a serializable value as a `{data: ...}` response with a custom
/// status code (e.g. 201 Created).
pub struct DataStatus<T>(pub StatusCode, pub T);

impl<T: Serialize> IntoResponse for DataStatus<T> {
    fn into_response(self) -> Response {
        (self.0, Json(Envelope { data: self.1 })).into_response()
    }
}

/// 204 No Content, for DELETE endpoints: no body on the wire.
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
