//! `GET /api/docs`, `GET /api/docs/spec.json`.
//! `ApiDoc` is generated straight from the same `#[derive(garde::Validate)]`
//! / `#[derive(utoipa::ToSchema)]` request and response structs every route
//! handler already uses, so there is exactly one place each schema is
//! defined and validators can never drift from the served document.

use axum::Json;
use axum::response::IntoResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::google_start,
        crate::routes::auth::google_callback,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::books::list,
        crate::routes::books::create,
        crate::routes::books::reorder,
        crate::routes::books::get,
        crate::routes::books::patch,
        crate::routes::books::delete,
        crate::routes::chapters::list,
        crate::routes::chapters::create,
        crate::routes::chapters::reorder,
        crate::routes::chapters::get,
        crate::routes::chapters::patch,
        crate::routes::chapters::delete,
        crate::routes::chapters::content,
        crate::routes::appearance::get,
        crate::routes::appearance::patch,
        crate::routes::appearance::patch_theme,
        crate::routes::sounds::get,
        crate::routes::sounds::patch,
        crate::routes::ambients::list,
        crate::routes::ambients::create,
        crate::routes::ambients::reorder,
        crate::routes::ambients::patch,
        crate::routes::ambients::delete,
        crate::routes::decorative_font::get,
        crate::routes::decorative_font::put,
        crate::routes::decorative_font::delete,
        crate::routes::default_settings::get,
        crate::routes::default_settings::patch,
        crate::routes::progress::get,
        crate::routes::progress::put,
        crate::routes::fonts::list,
        crate::routes::fonts::create,
        crate::routes::fonts::reorder,
        crate::routes::fonts::patch,
        crate::routes::fonts::delete,
        crate::routes::settings::get,
        crate::routes::settings::patch,
        crate::routes::upload::upload,
        crate::routes::export_import::export,
        crate::routes::export_import::import,
        crate::routes::migration::migrate,
        crate::routes::health::health,
        crate::routes::public::discover,
    ),
    components(schemas(
        crate::routes::auth::UserView,
        crate::routes::auth::RegisterBody,
        crate::routes::auth::LoginBody,
        crate::routes::auth::ForgotPasswordBody,
        crate::routes::auth::ResetPasswordBody,
        crate::routes::books::BookView,
        crate::routes::books::CreateBook,
        crate::routes::books::PatchBook,
        crate::routes::books::ReorderBody,
        crate::routes::chapters::ChapterView,
        crate::routes::chapters::CreateChapter,
        crate::routes::chapters::PatchChapter,
        crate::routes::chapters::ReorderBody,
        crate::routes::appearance::AppearanceView,
        crate::routes::appearance::ThemeView,
        crate::routes::appearance::PatchAppearance,
        crate::routes::appearance::PatchTheme,
        crate::routes::sounds::SoundsView,
        crate::routes::sounds::PatchSounds,
        crate::routes::ambients::AmbientView,
        crate::routes::ambients::CreateAmbient,
        crate::routes::ambients::PatchAmbient,
        crate::routes::ambients::ReorderBody,
        crate::routes::decorative_font::DecorativeFontView,
        crate::routes::decorative_font::PutDecorativeFont,
        crate::routes::default_settings::DefaultSettingsView,
        crate::routes::default_settings::PatchDefaultSettings,
        crate::routes::progress::ProgressView,
        crate::routes::progress::PutProgress,
        crate::routes::fonts::ReadingFontView,
        crate::routes::fonts::CreateReadingFont,
        crate::routes::fonts::PatchReadingFont,
        crate::routes::fonts::ReorderBody,
        crate::routes::settings::GlobalSettingsView,
        crate::routes::settings::PatchGlobalSettings,
        crate::routes::upload::UploadedAssetView,
        crate::routes::export_import::ExportBundle,
        crate::routes::export_import::ExportedBook,
        crate::routes::export_import::ImportBundle,
        crate::routes::migration::MigrationOutcome,
        crate::routes::health::HealthReport,
        crate::routes::health::SubsystemStatus,
    )),
    tags(
        (name = "auth", description = "Registration, session login, Google OAuth, password reset"),
        (name = "books", description = "Book aggregate"),
        (name = "chapters", description = "Chapters under a book"),
        (name = "appearance", description = "Per-book appearance (light/dark theme, font bounds)"),
        (name = "sounds", description = "Per-book sound URLs"),
        (name = "ambients", description = "Per-book ambient tracks"),
        (name = "decorative-font", description = "Per-book decorative font (0..1)"),
        (name = "default-settings", description = "Per-book default reader settings"),
        (name = "progress", description = "Per-book, per-user reading progress"),
        (name = "fonts", description = "User-scoped reading fonts"),
        (name = "settings", description = "User-scoped global settings"),
        (name = "upload", description = "Multipart asset and book intake"),
        (name = "export", description = "Whole-account export/import"),
        (name = "migration", description = "One-shot legacy-storage migration"),
        (name = "health", description = "Liveness and dependency health"),
        (name = "public", description = "Unauthenticated discovery"),
    ),
)]
pub struct ApiDoc;

/// `GET /docs` — the human-facing entry point; serves the same document
/// as `/docs/spec.json` since this API ships no Swagger UI asset bundle.
pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

pub async fn spec_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
