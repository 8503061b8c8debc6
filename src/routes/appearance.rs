//! `/api/books/:bookId/appearance`.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::BookAppearance;
use crate::db::queries::sub_resources;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;
use crate::validation::safe_url_double_opt;

#[derive(Serialize, ToSchema)]
pub struct AppearanceView {
    #[serde(rename = "fontMin")]
    pub font_min: i32,
    #[serde(rename = "fontMax")]
    pub font_max: i32,
    pub light: ThemeView,
    pub dark: ThemeView,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ThemeView {
    #[serde(rename = "coverBgStart")]
    pub cover_bg_start: String,
    #[serde(rename = "coverBgEnd")]
    pub cover_bg_end: String,
    #[serde(rename = "coverText")]
    pub cover_text: String,
    #[serde(rename = "coverBgImageUrl")]
    pub cover_bg_image_url: Option<String>,
    #[serde(rename = "pageTexture")]
    pub page_texture: String,
    #[serde(rename = "customTextureUrl")]
    pub custom_texture_url: Option<String>,
    #[serde(rename = "bgPage")]
    pub bg_page: String,
    #[serde(rename = "bgApp")]
    pub bg_app: String,
}

impl From<BookAppearance> for AppearanceView {
    fn from(a: BookAppearance) -> Self {
        AppearanceView {
            font_min: a.font_min,
            font_max: a.font_max,
            light: ThemeView {
                cover_bg_start: a.light_cover_bg_start,
                cover_bg_end: a.light_cover_bg_end,
                cover_text: a.light_cover_text,
                cover_bg_image_url: a.light_cover_bg_image_url,
                page_texture: a.light_page_texture,
                custom_texture_url: a.light_custom_texture_url,
                bg_page: a.light_bg_page,
                bg_app: a.light_bg_app,
            },
            dark: ThemeView {
                cover_bg_start: a.dark_cover_bg_start,
                cover_bg_end: a.dark_cover_bg_end,
                cover_text: a.dark_cover_text,
                cover_bg_image_url: a.dark_cover_bg_image_url,
                page_texture: a.dark_page_texture,
                custom_texture_url: a.dark_custom_texture_url,
                bg_page: a.dark_bg_page,
                bg_app: a.dark_bg_app,
            },
            updated_at: a.updated_at,
        }
    }
}

fn valid_font_bounds(max: &i32, ctx: &PatchAppearanceCtx) -> garde::Result {
    let min = ctx.font_min.unwrap_or(ctx.existing_min);
    if *max < min {
        return Err(garde::Error::new("fontMax must be >= fontMin"));
    }
    Ok(())
}

/// Context carrying the "other" bound so the cross-field predicate
/// (fontMin ≤ fontMax) can run without a DB call.
pub struct PatchAppearanceCtx {
    pub font_min: Option<i32>,
    pub existing_min: i32,
}

#[derive(Deserialize, Validate, ToSchema)]
#[garde(context(PatchAppearanceCtx))]
pub struct PatchAppearance {
    #[serde(rename = "fontMin")]
    #[garde(range(min = 8, max = 72))]
    pub font_min: Option<i32>,
    #[serde(rename = "fontMax")]
    #[garde(range(min = 8, max = 72), custom(valid_font_bounds))]
    pub font_max: Option<i32>,
}

#[utoipa::path(get, path = "/api/books/{bookId}/appearance", tag = "appearance")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let appearance = sub_resources::get_appearance(&state.db, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("appearance".to_string()))?;
    Ok(Data(AppearanceView::from(appearance)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/appearance", tag = "appearance", request_body = PatchAppearance)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<PatchAppearance>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let existing = sub_resources::get_appearance(&state.db, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("appearance".to_string()))?;

    body.validate(&PatchAppearanceCtx {
        font_min: body.font_min,
        existing_min: existing.font_min,
    })
    .map_err(|report| {
        crate::error::AppError::Validation(
            report
                .iter()
                .map(|(path, error)| crate::error::FieldViolation {
                    field: path.to_string(),
                    message: error.to_string(),
                })
                .collect(),
        )
    })?;

    let updated = sub_resources::update_appearance_bounds(
        &state.db,
        &book_id,
        body.font_min,
        body.font_max,
    )
    .await?
    .expect("book checked live above");
    Ok(Data(AppearanceView::from(updated)))
}

fn valid_theme(v: &str, _ctx: &()) -> garde::Result {
    match v {
        "light" | "dark" => Ok(()),
        _ => Err(garde::Error::new("must be light or dark")),
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchTheme {
    #[serde(rename = "coverBgStart")]
    #[garde(length(max = 32))]
    pub cover_bg_start: Option<String>,
    #[serde(rename = "coverBgEnd")]
    #[garde(length(max = 32))]
    pub cover_bg_end: Option<String>,
    #[serde(rename = "coverText")]
    #[garde(length(max = 32))]
    pub cover_text: Option<String>,
    #[serde(rename = "coverBgImageUrl")]
    #[garde(custom(safe_url_double_opt))]
    pub cover_bg_image_url: Option<Option<String>>,
    #[serde(rename = "pageTexture")]
    #[garde(custom(valid_page_texture))]
    pub page_texture: Option<String>,
    #[serde(rename = "customTextureUrl")]
    #[garde(custom(safe_url_double_opt))]
    pub custom_texture_url: Option<Option<String>>,
    #[serde(rename = "bgPage")]
    #[garde(length(max = 32))]
    pub bg_page: Option<String>,
    #[serde(rename = "bgApp")]
    #[garde(length(max = 32))]
    pub bg_app: Option<String>,
}

fn valid_page_texture(v: &str, _ctx: &()) -> garde::Result {
    match v {
        "default" | "none" | "custom" => Ok(()),
        _ => Err(garde::Error::new("must be one of default, none, custom")),
    }
}

#[utoipa::path(patch, path = "/api/books/{bookId}/appearance/{theme}", tag = "appearance", request_body = PatchTheme)]
pub async fn patch_theme(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, theme)): Path<(String, String)>,
    Json(body): Json<PatchTheme>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    if valid_theme(&theme, &()).is_err() {
        return Err(AppError::validation("theme", "must be light or dark"));
    }
    load_owned_book(&state, &user.id, &book_id).await?;

    let updated = sub_resources::update_appearance_theme(
        &state.db,
        &book_id,
        &theme,
        sub_resources::ThemePatch {
            cover_bg_start: body.cover_bg_start,
            cover_bg_end: body.cover_bg_end,
            cover_text: body.cover_text,
            cover_bg_image_url: body.cover_bg_image_url,
            page_texture: body.page_texture,
            custom_texture_url: body.custom_texture_url,
            bg_page: body.bg_page,
            bg_app: body.bg_app,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("appearance".to_string()))?;
    Ok(Data(AppearanceView::from(updated)))
}
