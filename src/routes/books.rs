//! `/api/books`. Ownership is enforced at the route head: a book that
//! doesn't exist (or is soft-deleted) is 404; a book that exists but
//! belongs to someone else is 403.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::Book;
use crate::db::queries::books;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::{Data, DataStatus, NoContent};
use crate::routes::util::{if_unmodified_since, validate};
use crate::state::AppState;
use crate::validation::safe_url_double_opt;

#[derive(Serialize, ToSchema)]
pub struct BookView {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub position: i64,
    pub visibility: String,
    #[serde(rename = "coverBgMode")]
    pub cover_bg_mode: String,
    #[serde(rename = "coverBgCustomUrl")]
    pub cover_bg_custom_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<Book> for BookView {
    fn from(b: Book) -> Self {
        BookView {
            id: b.id,
            user_id: b.user_id,
            title: b.title,
            author: b.author,
            position: b.position,
            visibility: b.visibility,
            cover_bg_mode: b.cover_bg_mode,
            cover_bg_custom_url: b.cover_bg_custom_url,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[garde(length(min = 1, max = 500))]
    pub title: String,
    #[garde(length(max = 500))]
    #[serde(default)]
    pub author: String,
}

fn valid_visibility(v: &str, _ctx: &()) -> garde::Result {
    match v {
        "draft" | "published" | "unlisted" => Ok(()),
        _ => Err(garde::Error::new("must be one of draft, published, unlisted")),
    }
}

fn valid_cover_bg_mode(v: &str, _ctx: &()) -> garde::Result {
    match v {
        "default" | "none" | "custom" => Ok(()),
        _ => Err(garde::Error::new("must be one of default, none, custom")),
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchBook {
    #[garde(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[garde(length(max = 500))]
    pub author: Option<String>,
    #[garde(custom(valid_visibility))]
    pub visibility: Option<String>,
    #[garde(custom(valid_cover_bg_mode))]
    #[serde(rename = "coverBgMode")]
    pub cover_bg_mode: Option<String>,
    #[garde(custom(safe_url_double_opt))]
    #[serde(rename = "coverBgCustomUrl")]
    pub cover_bg_custom_url: Option<Option<String>>,
}

#[derive(Deserialize, Validate, ToSchema)]
#[schema(as = books::ReorderBody)]
pub struct ReorderBody {
    #[garde(length(min = 1))]
    pub ids: Vec<String>,
}

/// Fetches the book and enforces the 403-before-404-for-strangers rule:
/// a missing/soft-deleted row is 404 regardless of who asks; an existing
/// row owned by someone else is 403.
pub async fn load_owned_book(state: &AppState, user_id: &str, book_id: &str) -> Result<Book, AppError> {
    let book = books::get_live(&state.db, book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("book".to_string()))?;
    if book.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(book)
}

#[utoipa::path(get, path = "/api/books", tag = "books", responses((status = 200, body = [BookView])))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let books = books::list_for_user(&state.db, &user.id).await?;
    Ok(Data(books.into_iter().map(BookView::from).collect::<Vec<_>>()))
}

#[utoipa::path(post, path = "/api/books", tag = "books", request_body = CreateBook, responses((status = 201, body = BookView)))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateBook>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    let bundle = books::create(&state.db, &user.id, &body.title, &body.author).await?;
    Ok(DataStatus(
        axum::http::StatusCode::CREATED,
        BookView::from(bundle.book),
    ))
}

#[utoipa::path(patch, path = "/api/books/reorder", tag = "books", request_body = ReorderBody)]
pub async fn reorder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    let ok = books::reorder(&state.db, &user.id, &body.ids).await?;
    if !ok {
        return Err(AppError::Conflict("reorder id set does not match live books".to_string()));
    }
    let books = books::list_for_user(&state.db, &user.id).await?;
    Ok(Data(books.into_iter().map(BookView::from).collect::<Vec<_>>()))
}

#[utoipa::path(get, path = "/api/books/{bookId}", tag = "books", responses((status = 200, body = BookView)))]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let book = load_owned_book(&state, &user.id, &book_id).await?;
    Ok(Data(BookView::from(book)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}", tag = "books", request_body = PatchBook)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PatchBook>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;

    let patch = books::BookPatch {
        title: body.title,
        author: body.author,
        visibility: body.visibility,
        cover_bg_mode: body.cover_bg_mode,
        cover_bg_custom_url: body.cover_bg_custom_url,
    };
    match books::update(&state.db, &book_id, patch, if_unmodified_since(&headers)).await? {
        books::UpdateOutcome::Updated(book) => Ok(Data(BookView::from(book))),
        books::UpdateOutcome::NotFound => Err(AppError::NotFound("book".to_string())),
        books::UpdateOutcome::Conflict => {
            Err(AppError::Conflict("book was modified since you last read it".to_string()))
        }
    }
}

#[utoipa::path(delete, path = "/api/books/{bookId}", tag = "books", responses((status = 204)))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    books::soft_delete(&state.db, &book_id).await?;
    Ok(NoContent)
}
