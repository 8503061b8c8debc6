//! `/api/auth/*`: registration, password login, Google OAuth, logout,
//! `me`, and the forgot/reset-password pair. Session rows live in the
//! database; the cookie only carries a signed pointer to one.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use garde::Validate;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::GoogleOAuthConfig;
use crate::db::models::User;
use crate::db::queries::{password_reset, sessions, users};
use crate::error::AppError;
use crate::http::csrf;
use crate::http::session::{AuthUser, CSRF_COOKIE, SESSION_COOKIE, sign_session_id, verify_session_cookie};
use crate::mailer;
use crate::password;
use crate::response::{Data, DataStatus, NoContent};
use crate::routes::util::validate;
use crate::state::AppState;

const OAUTH_STATE_COOKIE: &str = "oauth_state";

#[derive(Serialize, ToSchema)]
pub struct UserView {
    pub id: String,
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        UserView {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            username: u.username,
            bio: u.bio,
            avatar_url: u.avatar_url,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct RegisterBody {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 8, max = 200))]
    pub password: String,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginBody {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 200))]
    pub password: String,
}

/// Builds the two cookies a session carries: the HMAC-signed session id
/// (http-only) and the CSRF token derived from it (readable by the SPA so
/// it can echo it back in `x-csrf-token`).
fn issue_auth_cookies(state: &AppState, jar: CookieJar, session_id: &str) -> CookieJar {
    let signed = sign_session_id(session_id, &state.session_secret);
    let token = csrf::derive_token(session_id, &state.csrf_secret);

    let session_cookie = Cookie::build((SESSION_COOKIE, signed))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session_secure)
        .build();
    let csrf_cookie = Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(state.config.session_secure)
        .build();

    jar.add(session_cookie).add(csrf_cookie)
}

fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::from(SESSION_COOKIE))
        .remove(Cookie::from(CSRF_COOKIE))
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = RegisterBody, responses((status = 201, body = UserView)))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;

    if users::get_by_email(&state.db, &body.email).await?.is_some() {
        return Err(AppError::Conflict(
            "an account with this email already exists".to_string(),
        ));
    }

    let hash = password::hash(&body.password);
    let user = users::create(&state.db, &body.email, Some(&hash)).await?;
    let session = sessions::create(&state.db, &user.id, state.config.session_max_age_secs).await?;
    let jar = issue_auth_cookies(&state, jar, &session.id);

    Ok((jar, DataStatus(StatusCode::CREATED, UserView::from(user))))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = LoginBody, responses((status = 200, body = UserView)))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;

    // Constant-time from the caller's perspective: a missing user and a
    // wrong password both fall through to the same Unauthorized, and the
    // OAuth-only (no password_hash) case never reads a hash at all.
    let user = users::get_by_email(&state.db, &body.email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AppError::Unauthorized);
    };
    if !password::verify(&body.password, hash) {
        return Err(AppError::Unauthorized);
    }

    let session = sessions::create(&state.db, &user.id, state.config.session_max_age_secs).await?;
    let jar = issue_auth_cookies(&state, jar, &session.id);
    Ok((jar, Data(UserView::from(user))))
}

#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 204)))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Some(session_id) = verify_session_cookie(cookie.value(), &state.session_secret)
    {
        sessions::delete(&state.db, &session_id).await?;
    }
    Ok((clear_auth_cookies(jar), NoContent))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, body = UserView), (status = 401)))]
pub async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    Data(UserView::from(user))
}

fn build_google_client(google: &GoogleOAuthConfig) -> Result<BasicClient, AppError> {
    let client = BasicClient::new(ClientId::new(google.client_id.clone()))
        .set_client_secret(ClientSecret::new(google.client_secret.clone()))
        .set_auth_uri(
            AuthUrl::new("https://accounts.google.com/o/oauth2/v2/auth".to_string())
                .map_err(|e| AppError::Internal(format!("invalid auth url: {e}")))?,
        )
        .set_token_uri(
            TokenUrl::new("https://oauth2.googleapis.com/token".to_string())
                .map_err(|e| AppError::Internal(format!("invalid token url: {e}")))?,
        )
        .set_redirect_uri(
            RedirectUrl::new(google.callback_url.clone())
                .map_err(|e| AppError::Internal(format!("invalid redirect url: {e}")))?,
        );
    Ok(client)
}

#[derive(Serialize, Deserialize)]
struct OAuthState {
    csrf_token: String,
    pkce_verifier: String,
}

/// `GET /auth/google` — redirects to Google's consent screen. The CSRF
/// token and PKCE verifier are stashed in a short-lived cookie since no
/// session exists yet to hold server-side state.
#[utoipa::path(get, path = "/api/auth/google", tag = "auth", responses((status = 302)))]
pub async fn google_start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google OAuth is not configured".to_string()))?;
    let client = build_google_client(google)?;

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
    let (auth_url, csrf_token) = client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    let stashed = OAuthState {
        csrf_token: csrf_token.secret().clone(),
        pkce_verifier: pkce_verifier.secret().clone(),
    };
    let value = serde_json::to_string(&stashed)
        .map_err(|e| AppError::Internal(format!("failed to encode oauth state: {e}")))?;
    let cookie = Cookie::build((OAUTH_STATE_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session_secure)
        .build();

    Ok((jar.add(cookie), Redirect::to(auth_url.as_str())))
}

#[derive(Deserialize)]
pub struct GoogleCallbackQuery {
    code: String,
    state: String,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    email: String,
}

/// `GET /auth/google/callback` — exchanges the authorization code,
/// fetches the verified email, matches or auto-provisions a user with no
/// password hash, and redirects back to `APP_URL`.
#[utoipa::path(get, path = "/api/auth/google/callback", tag = "auth", responses((status = 302)))]
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<GoogleCallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let google = state
        .config
        .google
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Google OAuth is not configured".to_string()))?;

    let Some(stash) = jar.get(OAUTH_STATE_COOKIE) else {
        return Err(AppError::Unauthorized);
    };
    let stashed: OAuthState =
        serde_json::from_str(stash.value()).map_err(|_| AppError::Unauthorized)?;
    if stashed.csrf_token != query.state {
        return Err(AppError::Unauthorized);
    }

    let client = build_google_client(google)?;
    let http_client = reqwest::Client::new();
    let token = client
        .exchange_code(AuthorizationCode::new(query.code))
        .set_pkce_verifier(PkceCodeVerifier::new(stashed.pkce_verifier))
        .request_async(&http_client)
        .await
        .map_err(|e| AppError::Internal(format!("oauth token exchange failed: {e}")))?;

    let userinfo: GoogleUserInfo = http_client
        .get("https://www.googleapis.com/oauth2/v3/userinfo")
        .bearer_auth(token.access_token().secret())
        .send()
        .await
        .map_err(|e| AppError::Internal(format!("userinfo request failed: {e}")))?
        .json()
        .await
        .map_err(|e| AppError::Internal(format!("userinfo decode failed: {e}")))?;

    let user = match users::get_by_email(&state.db, &userinfo.email).await? {
        Some(user) => user,
        None => users::create(&state.db, &userinfo.email, None).await?,
    };

    let session = sessions::create(&state.db, &user.id, state.config.session_max_age_secs).await?;
    let jar = issue_auth_cookies(&state, jar, &session.id)
        .remove(Cookie::from(OAUTH_STATE_COOKIE));

    Ok((jar, Redirect::to(&state.config.app_url)))
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordBody {
    #[garde(email)]
    pub email: String,
}

/// Always reports success regardless of whether the email matches an
/// account, so the response can't be used to enumerate registered users.
#[utoipa::path(post, path = "/api/auth/forgot-password", tag = "auth", request_body = ForgotPasswordBody, responses((status = 204)))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;

    if let Some(user) = users::get_by_email(&state.db, &body.email).await? {
        let token = password_reset::create(&state.db, &user.id).await?;
        let reset_url = format!("{}/reset-password?token={}", state.config.app_url, token.id);
        if let Err(e) =
            mailer::send_password_reset_email(state.config.smtp.as_ref(), &user.email, &reset_url)
                .await
        {
            tracing::error!(error = %e, user_id = %user.id, "failed to send password reset email");
        }
    }

    Ok(NoContent)
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ResetPasswordBody {
    #[garde(length(min = 1))]
    pub token: String,
    #[garde(length(min = 8, max = 200))]
    pub password: String,
}

/// Consumes a single-use reset token and updates the password. Destroys
/// every existing session for the user, forcing re-login everywhere.
#[utoipa::path(post, path = "/api/auth/reset-password", tag = "auth", request_body = ResetPasswordBody, responses((status = 204)))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;

    let token = password_reset::get_live(&state.db, &body.token)
        .await?
        .ok_or_else(|| AppError::validation("token", "invalid or expired reset token"))?;

    let hash = password::hash(&body.password);
    users::set_password_hash(&state.db, &token.user_id, &hash).await?;
    password_reset::consume(&state.db, &token.id).await?;
    sessions::delete_all_for_user(&state.db, &token.user_id).await?;

    Ok(NoContent)
}
