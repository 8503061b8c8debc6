//! `/api/books/:bookId/chapters`. The parent book is loaded first;
//! ownership failures propagate as 403/404 before the chapter itself
//! is ever looked at.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::Chapter;
use crate::db::queries::chapters;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::parser::html::{sanitize, wrap_article};
use crate::response::{Data, DataStatus, NoContent};
use crate::routes::books::load_owned_book;
use crate::routes::util::{if_unmodified_since, validate};
use crate::state::AppState;
use crate::validation::MAX_CHAPTER_HTML_LEN;

#[derive(Serialize, ToSchema)]
pub struct ChapterView {
    pub id: String,
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub title: String,
    pub position: i64,
    pub bg: Option<String>,
    #[serde(rename = "bgMobile")]
    pub bg_mobile: Option<String>,
    #[serde(rename = "hasContent")]
    pub has_content: bool,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<Chapter> for ChapterView {
    fn from(c: Chapter) -> Self {
        ChapterView {
            id: c.id,
            book_id: c.book_id,
            title: c.title,
            position: c.position,
            bg: c.bg,
            bg_mobile: c.bg_mobile,
            has_content: c.html_content.is_some() || c.file_path.is_some(),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateChapter {
    #[garde(length(min = 1, max = 500))]
    pub title: String,
    #[garde(length(max = MAX_CHAPTER_HTML_LEN))]
    #[serde(default, rename = "htmlContent")]
    pub html_content: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchChapter {
    #[garde(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[garde(length(max = MAX_CHAPTER_HTML_LEN))]
    #[serde(rename = "htmlContent")]
    pub html_content: Option<String>,
    #[garde(skip)]
    pub bg: Option<Option<String>>,
    #[garde(skip)]
    #[serde(rename = "bgMobile")]
    pub bg_mobile: Option<Option<String>>,
}

#[derive(Deserialize, Validate, ToSchema)]
#[schema(as = chapters::ReorderBody)]
pub struct ReorderBody {
    #[garde(length(min = 1))]
    pub ids: Vec<String>,
}

async fn load_chapter_in_owned_book(
    state: &AppState,
    user_id: &str,
    book_id: &str,
    chapter_id: &str,
) -> Result<Chapter, AppError> {
    load_owned_book(state, user_id, book_id).await?;
    chapters::get_in_live_book(&state.db, book_id, chapter_id)
        .await?
        .ok_or_else(|| AppError::NotFound("chapter".to_string()))
}

#[utoipa::path(get, path = "/api/books/{bookId}/chapters", tag = "chapters")]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let rows = chapters::list_for_book(&state.db, &book_id).await?;
    Ok(Data(rows.into_iter().map(ChapterView::from).collect::<Vec<_>>()))
}

#[utoipa::path(post, path = "/api/books/{bookId}/chapters", tag = "chapters", request_body = CreateChapter)]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<CreateChapter>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;

    let html_content = body.html_content.as_deref().map(sanitize);
    let chapter = chapters::create(
        &state.db,
        &book_id,
        chapters::NewChapter {
            title: body.title,
            html_content,
            file_path: None,
        },
    )
    .await?;
    Ok(DataStatus(axum::http::StatusCode::CREATED, ChapterView::from(chapter)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/chapters/reorder", tag = "chapters", request_body = ReorderBody)]
pub async fn reorder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let ok = chapters::reorder(&state.db, &book_id, &body.ids).await?;
    if !ok {
        return Err(AppError::Conflict("reorder id set does not match live chapters".to_string()));
    }
    let rows = chapters::list_for_book(&state.db, &book_id).await?;
    Ok(Data(rows.into_iter().map(ChapterView::from).collect::<Vec<_>>()))
}

#[utoipa::path(get, path = "/api/books/{bookId}/chapters/{chapterId}", tag = "chapters")]
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, chapter_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let chapter = load_chapter_in_owned_book(&state, &user.id, &book_id, &chapter_id).await?;
    Ok(Data(ChapterView::from(chapter)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/chapters/{chapterId}", tag = "chapters", request_body = PatchChapter)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, chapter_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<PatchChapter>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_chapter_in_owned_book(&state, &user.id, &book_id, &chapter_id).await?;

    let patch = chapters::ChapterPatch {
        title: body.title,
        html_content: body.html_content.as_deref().map(sanitize),
        bg: body.bg,
        bg_mobile: body.bg_mobile,
    };
    match chapters::update(&state.db, &chapter_id, patch, if_unmodified_since(&headers)).await? {
        chapters::UpdateOutcome::Updated(chapter) => Ok(Data(ChapterView::from(chapter))),
        chapters::UpdateOutcome::NotFound => Err(AppError::NotFound("chapter".to_string())),
        chapters::UpdateOutcome::Conflict => {
            Err(AppError::Conflict("chapter was modified since you last read it".to_string()))
        }
    }
}

#[utoipa::path(delete, path = "/api/books/{bookId}/chapters/{chapterId}", tag = "chapters", responses((status = 204)))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, chapter_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    load_chapter_in_owned_book(&state, &user.id, &book_id, &chapter_id).await?;
    chapters::delete(&state.db, &chapter_id).await?;
    Ok(NoContent)
}

/// `GET .../content` returns the `<article>`-wrapped sanitized HTML body
/// as a JSON string — not the `ChapterView` envelope — since the client
/// renders it directly. The stored row holds the bare sanitized body;
/// the `<article>` wrapper is applied here at read time.
#[utoipa::path(get, path = "/api/books/{bookId}/chapters/{chapterId}/content", tag = "chapters")]
pub async fn content(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, chapter_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let chapter = load_chapter_in_owned_book(&state, &user.id, &book_id, &chapter_id).await?;
    let body = chapter.html_content.unwrap_or_default();
    Ok(Data(wrap_article(&body)))
}
