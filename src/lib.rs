pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod mailer;
pub mod parser;
pub mod password;
pub mod response;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;

use std::time::Duration;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::config::StorageConfig;
use crate::state::AppState;

/// Body cap covering every route: JSON bodies stay well under it and the
/// largest multipart upload kind (books, 50 MB) sets the ceiling;
/// `upload::upload` enforces each kind's tighter cap itself as the
/// multipart stream is read.
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Per-request deadline. General requests only need ~30s, but book
/// parsing is reachable from the same `/upload/book` route as every other
/// upload kind, so one 120s ceiling is applied pipeline-wide rather than
/// threading a second `TimeoutLayer` through a parallel router split.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Structured one-line-per-request log: method,
/// path, status, elapsed, request id. Must run inside (closer to the
/// handler than) `http::request_id::layer` so the task-local it reads is
/// already populated.
async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();
    let status = response.status();
    let request_id = http::request_id::current();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, request_id = %request_id, "request completed");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), elapsed_ms = elapsed.as_millis() as u64, request_id = %request_id, "request completed");
    }
    response
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state
        .config
        .cors_origin
        .parse()
        .unwrap_or_else(|_| "http://localhost:5173".parse().unwrap());
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
}

/// Assembles the full HTTP pipeline, layered outermost
/// (closest to the wire) to innermost (closest to the handler) in the
/// order the middleware list specifies: security headers, CORS, rate
/// limit, body parse, request id, structured log. Session resolution and
/// CSRF verification are implemented as extractors / a dedicated guard
/// layer rather than an always-run middleware, since only some routes
/// require a session and the CSRF guard must read the verified cookie the
/// session layer would otherwise duplicate. The error handler is implicit:
/// every `AppError` carries its own `IntoResponse`.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    // In dev, the local object store's "public URL" is served by this
    // same process under /objects; in prod the S3 public base points at
    // the bucket directly and nothing is mounted here.
    let objects_route = match &state.config.storage {
        StorageConfig::Local { root_path } => {
            Some(Router::new().nest_service("/objects", ServeDir::new(root_path.clone())))
        }
        StorageConfig::S3 { .. } => None,
    };

    let api = routes::router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http::csrf_guard::layer,
        ))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            http::rate_limit::layer,
        ))
        .layer(middleware::from_fn(access_log))
        .layer(middleware::from_fn(http::request_id::layer))
        .layer(cors)
        .layer(http::security_headers::content_security_policy())
        .layer(http::security_headers::referrer_policy())
        .layer(http::security_headers::frame_options())
        .layer(http::security_headers::content_type_options())
        .with_state(state);

    let router = Router::new().nest("/api", api);
    match objects_route {
        Some(objects) => router.merge(objects),
        None => router,
    }
}
