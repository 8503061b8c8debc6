//! `/api/books/:bookId/progress`. Last-write-wins: `PUT` always
//! overwrites, no merge against what's stored.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::ReadingProgress;
use crate::db::queries::reading_progress;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ProgressView {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub page: i32,
    pub font: Option<String>,
    #[serde(rename = "fontSize")]
    pub font_size: Option<i32>,
    pub theme: Option<String>,
    #[serde(rename = "soundEnabled")]
    pub sound_enabled: bool,
    #[serde(rename = "soundVolume")]
    pub sound_volume: f64,
    #[serde(rename = "ambientType")]
    pub ambient_type: Option<String>,
    #[serde(rename = "ambientVolume")]
    pub ambient_volume: f64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<ReadingProgress> for ProgressView {
    fn from(p: ReadingProgress) -> Self {
        ProgressView {
            book_id: p.book_id,
            page: p.page,
            font: p.font,
            font_size: p.font_size,
            theme: p.theme,
            sound_enabled: p.sound_enabled,
            sound_volume: p.sound_volume,
            ambient_type: p.ambient_type,
            ambient_volume: p.ambient_volume,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PutProgress {
    #[garde(range(min = 0))]
    pub page: i32,
    #[serde(default)]
    #[garde(length(max = 100))]
    pub font: Option<String>,
    #[serde(rename = "fontSize", default)]
    #[garde(range(min = 8, max = 72))]
    pub font_size: Option<i32>,
    #[serde(default)]
    #[garde(skip)]
    pub theme: Option<String>,
    #[serde(rename = "soundEnabled", default)]
    #[garde(skip)]
    pub sound_enabled: bool,
    #[serde(rename = "soundVolume", default)]
    #[garde(range(min = 0.0, max = 1.0))]
    pub sound_volume: f64,
    #[serde(rename = "ambientType", default)]
    #[garde(skip)]
    pub ambient_type: Option<String>,
    #[serde(rename = "ambientVolume", default)]
    #[garde(range(min = 0.0, max = 1.0))]
    pub ambient_volume: f64,
}

#[utoipa::path(get, path = "/api/books/{bookId}/progress", tag = "progress")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let progress = reading_progress::get(&state.db, &user.id, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("progress".to_string()))?;
    Ok(Data(ProgressView::from(progress)))
}

#[utoipa::path(put, path = "/api/books/{bookId}/progress", tag = "progress", request_body = PutProgress)]
pub async fn put(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<PutProgress>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let updated = reading_progress::upsert(
        &state.db,
        state.db_backend,
        &user.id,
        &book_id,
        reading_progress::ProgressSnapshot {
            page: body.page,
            font: body.font,
            font_size: body.font_size,
            theme: body.theme,
            sound_enabled: body.sound_enabled,
            sound_volume: body.sound_volume,
            ambient_type: body.ambient_type,
            ambient_volume: body.ambient_volume,
        },
    )
    .await?;
    Ok(Data(ProgressView::from(updated)))
}
