//! `/api/books/:bookId/sounds`.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::BookSounds;
use crate::db::queries::sub_resources;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;
use crate::validation::safe_url_double_opt;

#[derive(Serialize, ToSchema)]
pub struct SoundsView {
    #[serde(rename = "pageFlip")]
    pub page_flip: Option<String>,
    #[serde(rename = "bookOpen")]
    pub book_open: Option<String>,
    #[serde(rename = "bookClose")]
    pub book_close: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<BookSounds> for SoundsView {
    fn from(s: BookSounds) -> Self {
        SoundsView {
            page_flip: s.page_flip,
            book_open: s.book_open,
            book_close: s.book_close,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchSounds {
    #[serde(rename = "pageFlip")]
    #[garde(custom(safe_url_double_opt))]
    pub page_flip: Option<Option<String>>,
    #[serde(rename = "bookOpen")]
    #[garde(custom(safe_url_double_opt))]
    pub book_open: Option<Option<String>>,
    #[serde(rename = "bookClose")]
    #[garde(custom(safe_url_double_opt))]
    pub book_close: Option<Option<String>>,
}

#[utoipa::path(get, path = "/api/books/{bookId}/sounds", tag = "sounds")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let sounds = sub_resources::get_sounds(&state.db, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("sounds".to_string()))?;
    Ok(Data(SoundsView::from(sounds)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/sounds", tag = "sounds", request_body = PatchSounds)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<PatchSounds>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let updated = sub_resources::update_sounds(
        &state.db,
        &book_id,
        sub_resources::SoundsPatch {
            page_flip: body.page_flip,
            book_open: body.book_open,
            book_close: body.book_close,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("sounds".to_string()))?;
    Ok(Data(SoundsView::from(updated)))
}
