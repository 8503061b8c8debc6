use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tokio::task_local;

task_local! {
    static REQUEST_ID: String;
}

const HEADER_NAME: &str = "x-request-id";

/// Generates an opaque 128-bit request id and makes it available to
/// handlers and the error middleware via a task-local, the way the
/// teacher threads per-request state through a single owned value.
pub async fn layer(mut request: Request, next: Next) -> Response {
    let id = crate::db::models::new_id();
    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(HEADER_NAME, value.clone());
    }

    let id_for_response = id.clone();
    let mut response = REQUEST_ID.scope(id, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&id_for_response) {
        response.headers_mut().insert(HEADER_NAME, value);
    }
    response
}

/// The current request's id, or `"unknown"` when called outside a request
/// (e.g. from a test that doesn't go through the middleware stack).
pub fn current() -> String {
    REQUEST_ID
        .try_with(|id| id.clone())
        .unwrap_or_else(|_| "unknown".to_string())
}
