//! `/api/books/:bookId/decorative-font`. Cardinality 0..1 per book, so
//! it's a PUT/DELETE resource, not a collection.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::DecorativeFont;
use crate::db::queries::sub_resources;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::{Data, NoContent};
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;
use crate::validation::safe_url;

#[derive(Serialize, ToSchema)]
pub struct DecorativeFontView {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub name: String,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<DecorativeFont> for DecorativeFontView {
    fn from(f: DecorativeFont) -> Self {
        DecorativeFontView {
            book_id: f.book_id,
            name: f.name,
            file_url: f.file_url,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PutDecorativeFont {
    #[garde(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "fileUrl")]
    #[garde(length(min = 1, max = 500), custom(safe_url))]
    pub file_url: String,
}

#[utoipa::path(get, path = "/api/books/{bookId}/decorative-font", tag = "decorative-font")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let font = sub_resources::get_decorative_font(&state.db, &book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("decorative font".to_string()))?;
    Ok(Data(DecorativeFontView::from(font)))
}

#[utoipa::path(put, path = "/api/books/{bookId}/decorative-font", tag = "decorative-font", request_body = PutDecorativeFont)]
pub async fn put(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<PutDecorativeFont>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let font = sub_resources::put_decorative_font(&state.db, &book_id, &body.name, &body.file_url)
        .await?;
    Ok(Data(DecorativeFontView::from(font)))
}

#[utoipa::path(delete, path = "/api/books/{bookId}/decorative-font", tag = "decorative-font", responses((status = 204)))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    sub_resources::delete_decorative_font(&state.db, &book_id).await?;
    Ok(NoContent)
}
