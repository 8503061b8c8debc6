//! `/api/books/:bookId/default-settings`.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::BookDefaultSettings;
use crate::db::queries::sub_resources;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DefaultSettingsView {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub font: String,
    #[serde(rename = "fontSize")]
    pub font_size: i32,
    pub theme: String,
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

impl From<BookDefaultSettings> for DefaultSettingsView {
    fn from(s: BookDefaultSettings) -> Self {
        DefaultSettingsView {
            book_id: s.book_id,
            font: s.font,
            font_size: s.font_size,
            theme: s.theme,
            sound_enabled: s.sound_enabled,
            sound_volume: s.sound_volume,
            ambient_type: s.ambient_type,
            ambient_volume: s.ambient_volume,
            updated_at: s.updated_at,
        }
    }
}

fn valid_theme(v: &str, _ctx: &()) -> garde::Result {
    match v {
        "light" | "dark" => Ok(()),
        _ => Err(garde::Error::new("must be light or dark")),
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchDefaultSettings {
    #[garde(length(min = 1, max = 100))]
    pub font: Option<String>,
    #[serde(rename = "fontSize")]
    #[garde(range(min = 8, max = 72))]
    pub font_size: Option<i32>,
    #[garde(custom(valid_theme))]
    pub theme: Option<String>,
    #[serde(rename = "soundEnabled")]
    #[garde(skip)]
    pub sound_enabled: Option<bool>,
    #[serde(rename = "soundVolume")]
    #[garde(range(min = 0.0, max = 1.0))]
    pub sound_volume: Option<f64>,
    #[serde(rename = "ambientType")]
    #[garde(skip)]
    pub ambient_type: Option<Option<String>>,
    #[serde(rename = "ambientVolume")]
    #[garde(range(min = 0.0, max = 1.0))]
    pub ambient_volume: Option<f64>,
}

#[utoipa::path(get, path = "/api/books/{bookId}/default-settings", tag = "default-settings")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let settings = sub_resources::get_default_settings(&state.db, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("default settings".to_string()))?;
    Ok(Data(DefaultSettingsView::from(settings)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/default-settings", tag = "default-settings", request_body = PatchDefaultSettings)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<PatchDefaultSettings>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let updated = sub_resources::update_default_settings(
        &state.db,
        &book_id,
        sub_resources::DefaultSettingsPatch {
            font: body.font,
            font_size: body.font_size,
            theme: body.theme,
            sound_enabled: body.sound_enabled,
            sound_volume: body.sound_volume,
            ambient_type: body.ambient_type,
            ambient_volume: body.ambient_volume,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("default settings".to_string()))?;
    Ok(Data(DefaultSettingsView::from(updated)))
}
