pub mod ambients;
pub mod appearance;
pub mod auth;
pub mod books;
pub mod chapters;
pub mod decorative_font;
pub mod default_settings;
pub mod docs;
pub mod export_import;
pub mod fonts;
pub mod health;
pub mod migration;
pub mod progress;
pub mod public;
pub mod settings;
pub mod sounds;
pub mod upload;
pub mod util;

use axum::Router;
use axum::routing::{get, patch, post};

use crate::state::AppState;

/// Every `/api/*` route, grouped by aggregate. Thin
/// `.route(...)` wiring only — handlers live in the per-aggregate modules
/// above; this is the one place their paths are declared.
pub fn router() -> Router<AppState> {
    let auth = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/google", get(auth::google_start))
        .route("/google/callback", get(auth::google_callback))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));

    let books = Router::new()
        .route("/", get(books::list).post(books::create))
        .route("/reorder", patch(books::reorder))
        .route(
            "/{bookId}",
            get(books::get).patch(books::patch).delete(books::delete),
        )
        .route(
            "/{bookId}/chapters",
            get(chapters::list).post(chapters::create),
        )
        .route("/{bookId}/chapters/reorder", patch(chapters::reorder))
        .route(
            "/{bookId}/chapters/{chapterId}",
            get(chapters::get)
                .patch(chapters::patch)
                .delete(chapters::delete),
        )
        .route(
            "/{bookId}/chapters/{chapterId}/content",
            get(chapters::content),
        )
        .route(
            "/{bookId}/appearance",
            get(appearance::get).patch(appearance::patch),
        )
        .route(
            "/{bookId}/appearance/{theme}",
            patch(appearance::patch_theme),
        )
        .route("/{bookId}/sounds", get(sounds::get).patch(sounds::patch))
        .route(
            "/{bookId}/ambients",
            get(ambients::list).post(ambients::create),
        )
        .route("/{bookId}/ambients/reorder", patch(ambients::reorder))
        .route(
            "/{bookId}/ambients/{ambientId}",
            patch(ambients::patch).delete(ambients::delete),
        )
        .route(
            "/{bookId}/decorative-font",
            get(decorative_font::get)
                .put(decorative_font::put)
                .delete(decorative_font::delete),
        )
        .route(
            "/{bookId}/default-settings",
            get(default_settings::get).patch(default_settings::patch),
        )
        .route(
            "/{bookId}/progress",
            get(progress::get).put(progress::put),
        );

    let fonts = Router::new()
        .route("/", get(fonts::list).post(fonts::create))
        .route("/reorder", patch(fonts::reorder))
        .route("/{fontId}", patch(fonts::patch).delete(fonts::delete));

    Router::new()
        .nest("/auth", auth)
        .nest("/books", books)
        .nest("/fonts", fonts)
        .route("/settings", get(settings::get).patch(settings::patch))
        .route("/upload/{kind}", post(upload::upload))
        .route("/export", get(export_import::export))
        .route("/import", post(export_import::import))
        .route("/migrate", post(migration::migrate))
        .route("/health", get(health::health))
        .route("/docs", get(docs::docs))
        .route("/docs/spec.json", get(docs::spec_json))
        .route("/public/discover", get(public::discover))
}
