use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::http::csrf::verify_token;
use crate::http::session::{SESSION_COOKIE, verify_session_cookie};
use crate::state::AppState;

/// Exempt paths: login/register/OAuth establish the session itself, so
/// they cannot yet carry a CSRF token bound to it.
fn is_exempt(path: &str) -> bool {
    matches!(
        path,
        "/api/auth/register"
            | "/api/auth/login"
            | "/api/auth/google"
            | "/api/auth/google/callback"
            | "/api/auth/forgot-password"
            | "/api/auth/reset-password"
    )
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PATCH | Method::PUT | Method::DELETE
    )
}

/// Requires every state-changing request (other than the auth
/// bootstrap endpoints) to carry the CSRF token the session owns, via
/// the `x-csrf-token` header (double-submit against the `csrf_token`
/// cookie).
pub async fn layer(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();
    if !is_state_changing(request.method()) || is_exempt(path) {
        return Ok(next.run(request).await);
    }

    let Some(session_cookie) = jar.get(SESSION_COOKIE) else {
        return Err(AppError::Unauthorized);
    };
    let Some(session_id) = verify_session_cookie(session_cookie.value(), &state.session_secret)
    else {
        return Err(AppError::Unauthorized);
    };

    // Deliberately header-only: the matching cookie is exactly what a
    // cross-site request would carry automatically, so falling back to it
    // here would defeat the double-submit check entirely.
    let provided = request
        .headers()
        .get("x-csrf-token")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(token) if verify_token(&session_id, &state.csrf_secret, token) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Forbidden),
    }
}
