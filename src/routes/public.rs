//! `GET /api/public/discover`. Unauthenticated; the only route in the API
//! that reads across users rather than the caller's own aggregates.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::db::queries::books;
use crate::error::AppError;
use crate::response::Data;
use crate::routes::books::BookView;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct DiscoverQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(get, path = "/api/public/discover", tag = "public", responses((status = 200, body = [BookView])))]
pub async fn discover(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let books = books::list_published(&state.db, limit).await?;
    Ok(Data(books.into_iter().map(BookView::from).collect::<Vec<_>>()))
}
