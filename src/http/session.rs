use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::db::models::User;
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";
pub const CSRF_COOKIE: &str = "csrf_token";

type HmacSha256 = Hmac<Sha256>;

/// Signs an opaque session id the way the teacher signs its session
/// cookie (`web/auth.rs::sign_session`), adapted so the cookie carries a
/// DB-row session id instead of an embedded user id + expiry: the DB row
/// is the source of truth for expiry, the signature only prevents a
/// forged id from reaching the DB lookup.
pub fn sign_session_id(session_id: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any size");
    mac.update(session_id.as_bytes());
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("{session_id}:{sig}")
}

pub fn verify_session_cookie(cookie_value: &str, secret: &[u8]) -> Option<String> {
    let (id, sig_hex) = cookie_value.split_once(':')?;
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts a key of any size");
    mac.update(id.as_bytes());
    let expected = hex::decode(sig_hex).ok()?;
    mac.verify_slice(&expected).ok()?;
    Some(id.to_string())
}

/// The authenticated caller, resolved from the session cookie. Use this
/// extractor on any route that requires a session; it rejects with
/// `AppError::Unauthorized` when the cookie is absent, malformed, or the
/// session has expired.
pub struct AuthUser(pub User);

/// Same resolution as `AuthUser` but non-rejecting, for routes that
/// behave differently for anonymous callers (e.g. `/public/discover`
/// is unauthenticated-first but nothing else currently needs it).
pub struct MaybeAuthUser(pub Option<User>);

async fn resolve(parts: &Parts, state: &AppState) -> Option<User> {
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(SESSION_COOKIE)?;
    let session_id = verify_session_cookie(cookie.value(), &state.session_secret)?;
    let session = crate::db::queries::sessions::get_live(&state.db, &session_id)
        .await
        .ok()??;
    crate::db::queries::users::get_by_id(&state.db, &session.user_id)
        .await
        .ok()?
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve(parts, state).await.map(AuthUser))
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(resolve(parts, state).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_session_id() {
        let signed = sign_session_id("session-123", b"secret");
        assert_eq!(verify_session_cookie(&signed, b"secret"), Some("session-123".to_string()));
    }

    #[test]
    fn rejects_tampered_id() {
        let signed = sign_session_id("session-123", b"secret");
        let tampered = signed.replace("session-123", "session-456");
        assert_eq!(verify_session_cookie(&tampered, b"secret"), None);
    }

    #[test]
    fn rejects_wrong_secret() {
        let signed = sign_session_id("session-123", b"secret-a");
        assert_eq!(verify_session_cookie(&signed, b"secret-b"), None);
    }
}
