//! `/api/books/:bookId/ambients`. Builtin ambients can be toggled but
//! never deleted.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::Ambient;
use crate::db::queries::ambients;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::{Data, DataStatus, NoContent};
use crate::routes::books::load_owned_book;
use crate::routes::util::validate;
use crate::state::AppState;
use crate::validation::safe_url_double_opt;

#[derive(Serialize, ToSchema)]
pub struct AmbientView {
    pub id: String,
    #[serde(rename = "bookId")]
    pub book_id: String,
    #[serde(rename = "ambientKey")]
    pub ambient_key: String,
    pub label: String,
    #[serde(rename = "shortLabel")]
    pub short_label: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
    pub visible: bool,
    pub builtin: bool,
    pub position: i64,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

impl From<Ambient> for AmbientView {
    fn from(a: Ambient) -> Self {
        AmbientView {
            id: a.id,
            book_id: a.book_id,
            ambient_key: a.ambient_key,
            label: a.label,
            short_label: a.short_label,
            icon: a.icon,
            file_url: a.file_url,
            visible: a.visible,
            builtin: a.builtin,
            position: a.position,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateAmbient {
    #[serde(rename = "ambientKey")]
    #[garde(length(min = 1, max = 100))]
    pub ambient_key: String,
    #[garde(length(min = 1, max = 200))]
    pub label: String,
    #[serde(rename = "shortLabel", default)]
    #[garde(length(max = 200))]
    pub short_label: Option<String>,
    #[garde(custom(safe_url_double_opt))]
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "fileUrl")]
    #[garde(custom(safe_url_double_opt))]
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct PatchAmbient {
    #[garde(length(min = 1, max = 200))]
    pub label: Option<String>,
    #[serde(rename = "shortLabel")]
    #[garde(skip)]
    pub short_label: Option<Option<String>>,
    #[garde(custom(safe_url_double_opt))]
    pub icon: Option<Option<String>>,
    #[serde(rename = "fileUrl")]
    #[garde(custom(safe_url_double_opt))]
    pub file_url: Option<Option<String>>,
    pub visible: Option<bool>,
}

#[derive(Deserialize, Validate, ToSchema)]
#[schema(as = ambients::ReorderBody)]
pub struct ReorderBody {
    #[garde(length(min = 1))]
    pub ids: Vec<String>,
}

async fn load_ambient_in_owned_book(
    state: &AppState,
    user_id: &str,
    book_id: &str,
    ambient_id: &str,
) -> Result<Ambient, AppError> {
    load_owned_book(state, user_id, book_id).await?;
    let ambient = ambients::get(&state.db, ambient_id)
        .await?
        .ok_or_else(|| AppError::NotFound("ambient".to_string()))?;
    if ambient.book_id != book_id {
        return Err(AppError::NotFound("ambient".to_string()));
    }
    Ok(ambient)
}

#[utoipa::path(get, path = "/api/books/{bookId}/ambients", tag = "ambients")]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    load_owned_book(&state, &user.id, &book_id).await?;
    let rows = ambients::list_for_book(&state.db, &book_id).await?;
    Ok(Data(rows.into_iter().map(AmbientView::from).collect::<Vec<_>>()))
}

#[utoipa::path(post, path = "/api/books/{bookId}/ambients", tag = "ambients", request_body = CreateAmbient)]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<CreateAmbient>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let ambient = ambients::create(
        &state.db,
        &book_id,
        ambients::NewAmbient {
            ambient_key: body.ambient_key,
            label: body.label,
            short_label: body.short_label,
            icon: body.icon,
            file_url: body.file_url,
        },
    )
    .await?;
    Ok(DataStatus(axum::http::StatusCode::CREATED, AmbientView::from(ambient)))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/ambients/reorder", tag = "ambients", request_body = ReorderBody)]
pub async fn reorder(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<String>,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_owned_book(&state, &user.id, &book_id).await?;
    let ok = ambients::reorder(&state.db, &book_id, &body.ids).await?;
    if !ok {
        return Err(AppError::Conflict("reorder id set does not match live ambients".to_string()));
    }
    let rows = ambients::list_for_book(&state.db, &book_id).await?;
    Ok(Data(rows.into_iter().map(AmbientView::from).collect::<Vec<_>>()))
}

#[utoipa::path(patch, path = "/api/books/{bookId}/ambients/{ambientId}", tag = "ambients", request_body = PatchAmbient)]
pub async fn patch(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, ambient_id)): Path<(String, String)>,
    Json(body): Json<PatchAmbient>,
) -> Result<impl IntoResponse, AppError> {
    validate(&body)?;
    load_ambient_in_owned_book(&state, &user.id, &book_id, &ambient_id).await?;
    let updated = ambients::update(
        &state.db,
        &ambient_id,
        ambients::AmbientPatch {
            label: body.label,
            short_label: body.short_label,
            icon: body.icon,
            file_url: body.file_url,
            visible: body.visible,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("ambient".to_string()))?;
    Ok(Data(AmbientView::from(updated)))
}

#[utoipa::path(delete, path = "/api/books/{bookId}/ambients/{ambientId}", tag = "ambients", responses((status = 204)))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((book_id, ambient_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let ambient = load_ambient_in_owned_book(&state, &user.id, &book_id, &ambient_id).await?;
    if ambient.builtin {
        return Err(AppError::validation("id", "builtin ambients cannot be deleted"));
    }
    ambients::delete(&state.db, &ambient_id).await?;
    Ok(NoContent)
}
