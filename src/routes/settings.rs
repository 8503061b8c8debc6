//! `/api/settings`. One row per user, created lazily on first read.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::GlobalSettings;
use crate::db::queries::sub_resources;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct GlobalSettingsView {
    #[serde(rename = "fontMin")]
    pub font_min: i32,
    #[serde(rename = "fontMax")]
    pub font_max: i32,
    #[serde(rename = "visibilityFontSize")]
    pub visibility_font_size: bool,
    #[serde(rename = "visibilityTheme")]
    pub visibility_theme: bool,
    #[serde(rename = "visibilityFont")]
    pub visibility_font: bool,
    #[serde(rename = "visibilityFullscreen")]
    pub visibility_fullscreen: bool,
    #[serde(rename = "visibilitySound")]
    pub visibility_sound: bool,
    #[serde(rename = "visibilityAmbient")]
    pub visibility_ambient: bool,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<GlobalSettings> for GlobalSettingsView {
    fn from(s: GlobalSettings) -> Self {
        GlobalSettingsView {
            font_min: s.font_min,
            font_max: s.font_max,
            visibility_font_size: s.visibility_font_size,
            visibility_theme: s.visibility_theme,
            visibility_font: s.visibility_font,
            visibility_fullscreen: s.visibility_fullscreen,
            visibility_sound: s.visibility_sound,
            visibility_ambient: s.visibility_ambient,
            updated_at: s.updated_at,
        }
    }
}

fn valid_bounds(max: &i32, ctx: &PatchGlobalSettingsCtx) -> garde::Result {
    let min = ctx.font_min.unwrap_or(ctx.existing_min);
    if *max < min {
        return Err(garde::Error::new("fontMax must be >= fontMin"));
    }
    Ok(())
}

pub struct PatchGlobalSettingsCtx {
    pub font_min: Option<i32>,
    pub existing_min: i32,
}

#[derive(Deserialize, Validate, ToSchema)]
#[garde(context(PatchGlobalSettingsCtx))]
pub struct PatchGlobalSettings {
    #[serde(rename = "fontMin")]
    #[garde(range(min = 8, max = 72))]
    pub font_min: Option<i32>,
    #[serde(rename = "fontMax")]
    #[garde(range(min = 8, max = 72), custom(valid_bounds))]
    pub font_max: Option<i32>,
    #[serde(rename = "visibilityFontSize")]
    #[garde(skip)]
    pub visibility_font_size: Option<bool>,
    #[serde(rename = "visibilityTheme")]
    #[garde(skip)]
    pub visibility_theme: Option<bool>,
    #[serde(rename = "visibilityFont")]
    #[garde(skip)]
    pub visibility_font: Option<bool>,
    #[serde(rename = "visibilityFullscreen")]
    #[garde(skip)]
    pub visibility_fullscreen: Option<bool>,
    #[serde(rename = "visibilitySound")]
    #[garde(skip)]
    pub visibility_sound: Option<bool>,
    #[serde(rename = "visibilityAmbient")]
    #[garde(skip)]
    pub visibility_ambient: Option<bool>,
}

#[utoipa::path(get, path = "/api/settings", tag = "settings")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let settings = sub_resources::get_or_create_global_settings(&state.db, &user.id).await?;
    Ok(Data(GlobalSettingsView::from(settings)))
}

#[utoipa::path(patch, path = "/api/settings", tag = "settings", request_body = PatchGlobalSettings)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<PatchGlobalSettings>,
) -> Result<impl IntoResponse, AppError> {
    let existing = sub_resources::get_or_create_global_settings(&state.db, &user.id).await?;

    body.validate(&PatchGlobalSettingsCtx {
        font_min: body.font_min,
        existing_min: existing.font_min,
    })
    .map_err(|report| {
        AppError::Validation(
            report
                .iter()
                .map(|(path, error)| crate::error::FieldViolation {
                    field: path.to_string(),
                    message: error.to_string(),
                })
                .collect(),
        )
    })?;

    let updated = sub_resources::update_global_settings(
        &state.db,
        &user.id,
        sub_resources::GlobalSettingsPatch {
            font_min: body.font_min,
            font_max: body.font_max,
            visibility_font_size: body.visibility_font_size,
            visibility_theme: body.visibility_theme,
            visibility_font: body.visibility_font,
            visibility_fullscreen: body.visibility_fullscreen,
            visibility_sound: body.visibility_sound,
            visibility_ambient: body.visibility_ambient,
        },
    )
    .await?;
    Ok(Data(GlobalSettingsView::from(updated)))
}
