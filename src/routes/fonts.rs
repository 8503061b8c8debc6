//! `/api/fonts`. User-scoped, not book-scoped; builtins are seeded lazily
//! on first list and can be toggled but never deleted.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::ReadingFont;
use crate::db::queries::reading_fonts;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::{Data, DataStatus, NoContent};
use crate::routes::util::validate;
use crate::state::AppState;
use crate::validation::safe_url_opt;

#[derive(Serialize, ToSchema)]
pub struct ReadingFontView {
    pub id: String,
    #[serde(rename = "fontKey")]
    pub font_key: String,
    pub label: String,
    pub family: String,
    pub builtin: bool,
    pub enabled: bool,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
    pub position: i64,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<ReadingFont> for ReadingFontView {
    fn from(f: ReadingFont) -> Self {
        ReadingFontView {
            id: f.id,
            font_key: f.font_key,
            label: f.label,
            family: f.family,
            builtin: f.builtin,
            enabled: f.enabled,
            file_url: f.file_url,
            position: f.position,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateReadingFont {
    #[serde(rename = "fontKey")]
    #[garde(length(min = 1, max = 100))]
    pub font_key: String,
    #[garde(length(min = 1, max = 200))]
    pub label: String,
    #[garde(length(min = 1, max = 300))]
    pub family: String,
    #[serde(rename = "fileUrl", default)]
    #[garde(custom(safe_url_opt))]
    pub file_url: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchReadingFont {
    #[garde(length(min = 1, max = 200))]
    pub label: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct ReorderBody {
    #[garde(length(min = 1))]
    pub ids: Vec<String>,
}

async fn load_owned_font(
    state: &AppState,
    user_id: &str,
    font_id: &str,
) -> Result<ReadingFont, AppError> {
    let font = reading_fonts::get(&state.db, font_id)
        .await?
        .ok_or_else(|| AppError::NotFound("reading font".to_string()))?;
    if font.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(font)
}

#[utoipa::path(get, path = "/api/fonts", tag = "fonts")]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    reading_fonts::ensure_builtins_seeded(&state.db, &user.id).await?;
    let rows = reading_fonts::list_for_user(&state.db, &user.id).await?;
    Ok(Data(rows.into_iter().map(ReadingFontView::from).collect::<Vec<_>>()))
}

#[utoipa::path(post, path = "/api/fonts", tag = "fonts", request_body = CreateReadingFont)]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateReadingFont>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    reading_fonts::ensure_builtins_seeded(&state.db, &user.id).await?;
    let font = reading_fonts::create(
        &state.db,
        &user.id,
        reading_fonts::NewReadingFont {
            font_key: body.font_key,
            label: body.label,
            family: body.family,
            file_url: body.file_url,
        },
    )
    .await?;
    Ok(DataStatus(axum::http::StatusCode::CREATED, ReadingFontView::from(font)))
}

#[utoipa::path(patch, path = "/api/fonts/reorder", tag = "fonts", request_body = ReorderBody)]
pub async fn reorder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    let ok = reading_fonts::reorder(&state.db, &user.id, &body.ids).await?;
    if !ok {
        return Err(AppError::Conflict("reorder id set does not match live fonts".to_string()));
    }
    let rows = reading_fonts::list_for_user(&state.db, &user.id).await?;
    Ok(Data(rows.into_iter().map(ReadingFontView::from).collect::<Vec<_>>()))
}

#[utoipa::path(patch, path = "/api/fonts/{fontId}", tag = "fonts", request_body = PatchReadingFont)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(font_id): Path<String>,
    Json(body): Json<PatchReadingFont>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_font(&state, &user.id, &font_id).await?;
    let updated = reading_fonts::update(
        &state.db,
        &font_id,
        reading_fonts::ReadingFontPatch {
            label: body.label,
            enabled: body.enabled,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("reading font".to_string()))?;
    Ok(Data(ReadingFontView::from(updated)))
}

#[utoipa::path(delete, path = "/api/fonts/{fontId}", tag = "fonts", responses((status = 204)))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(font_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let font = load_owned_font(&state, &user.id, &font_id).await?;
    if font.builtin {
        return Err(AppError::validation("id", "builtin reading fonts cannot be deleted"));
    }
    reading_fonts::delete(&state.db, &font_id).await?;
    Ok(NoContent)
}
