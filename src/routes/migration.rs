//! `POST /api/migrate`. One-shot legacy-browser-storage import: runs only
//! if the caller has no live books yet, so a retried or duplicate call is
//! a safe no-op rather than a second copy of the data.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::queries::books;
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::response::Data;
use crate::routes::export_import::{ImportBundle, import_one_book};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MigrationOutcome {
    /// The caller already has live books; the client should discard its
    /// local legacy copy rather than double-import.
    Skipped,
    Imported { books: usize },
}

#[utoipa::path(post, path = "/api/migrate", tag = "migration", request_body = ImportBundle, responses((status = 200, body = MigrationOutcome)))]
pub async fn migrate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ImportBundle>,
) -> Result<impl IntoResponse, AppError> {
    let existing = books::list_for_user(&state.db, &user.id).await?;
    if !existing.is_empty() {
        return Ok(Data(MigrationOutcome::Skipped));
    }

    let book_count = body.books.len();
    let mut tx = state.db.begin().await?;

    for book in body.books {
        import_one_book(&mut tx, &user.id, book).await?;
    }

    crate::db::queries::reading_fonts::ensure_builtins_seeded(&mut *tx, &user.id).await?;
    for font in body.reading_fonts {
        crate::db::queries::reading_fonts::create(
            &mut *tx,
            &user.id,
            crate::db::queries::reading_fonts::NewReadingFont {
                font_key: font.font_key,
                label: font.label,
                family: font.family,
                file_url: font.file_url,
            },
        )
        .await?;
    }

    if let Some(settings) = body.global_settings {
        crate::db::queries::sub_resources::update_global_settings(
            &mut *tx,
            &user.id,
            crate::db::queries::sub_resources::GlobalSettingsPatch {
                font_min: settings.font_min,
                font_max: settings.font_max,
                visibility_font_size: settings.visibility_font_size,
                visibility_theme: settings.visibility_theme,
                visibility_font: settings.visibility_font,
                visibility_fullscreen: settings.visibility_fullscreen,
                visibility_sound: settings.visibility_sound,
                visibility_ambient: settings.visibility_ambient,
            },
        )
        .await?;
    }

    tx.commit().await?;

    Ok(Data(MigrationOutcome::Imported { books: book_count }))
}
