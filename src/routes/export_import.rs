//! `GET /api/export`, `POST /api/import`. Export dumps the caller's entire
//! live tree; import reconstructs the same shape under the caller,
//! appending after any books that already exist.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::queries::{ambients, books, chapters, reading_fonts, sub_resources};
use crate::error::AppError;
use crate::http::session::AuthUser;
use crate::parser::html::sanitize;
use crate::response::Data;
use crate::routes::ambients::AmbientView;
use crate::routes::appearance::AppearanceView;
use crate::routes::books::BookView;
use crate::routes::chapters::ChapterView;
use crate::routes::decorative_font::DecorativeFontView;
use crate::routes::default_settings::DefaultSettingsView;
use crate::routes::fonts::ReadingFontView;
use crate::routes::settings::GlobalSettingsView;
use crate::routes::sounds::SoundsView;
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct ExportedBook {
    pub book: BookView,
    pub appearance: AppearanceView,
    pub sounds: SoundsView,
    #[serde(rename = "defaultSettings")]
    pub default_settings: DefaultSettingsView,
    #[serde(rename = "decorativeFont")]
    pub decorative_font: Option<DecorativeFontView>,
    pub chapters: Vec<ChapterView>,
    pub ambients: Vec<AmbientView>,
}

#[derive(Serialize, ToSchema)]
pub struct ExportBundle {
    pub books: Vec<ExportedBook>,
    #[serde(rename = "readingFonts")]
    pub reading_fonts: Vec<ReadingFontView>,
    #[serde(rename = "globalSettings")]
    pub global_settings: GlobalSettingsView,
}

async fn build_export(state: &AppState, user_id: &str) -> Result<ExportBundle, AppError> {
    let live_books = books::list_for_user(&state.db, user_id).await?;
    let mut exported_books = Vec::with_capacity(live_books.len());
    for book in live_books {
        let appearance = sub_resources::get_appearance(&state.db, &book.id)
            .await?
            .expect("every book owns an appearance row");
        let sounds = sub_resources::get_sounds(&state.db, &book.id)
            .await?
            .expect("every book owns a sounds row");
        let default_settings = sub_resources::get_default_settings(&state.db, &book.id)
            .await?
            .expect("every book owns a default-settings row");
        let decorative_font = sub_resources::get_decorative_font(&state.db, &book.id).await?;
        let chapters = chapters::list_for_book(&state.db, &book.id).await?;
        let ambients = ambients::list_for_book(&state.db, &book.id).await?;

        exported_books.push(ExportedBook {
            book: BookView::from(book),
            appearance: AppearanceView::from(appearance),
            sounds: SoundsView::from(sounds),
            default_settings: DefaultSettingsView::from(default_settings),
            decorative_font: decorative_font.map(DecorativeFontView::from),
            chapters: chapters.into_iter().map(ChapterView::from).collect(),
            ambients: ambients.into_iter().map(AmbientView::from).collect(),
        });
    }

    reading_fonts::ensure_builtins_seeded(&state.db, user_id).await?;
    let reading_fonts = reading_fonts::list_for_user(&state.db, user_id)
        .await?
        .into_iter()
        .map(ReadingFontView::from)
        .collect();
    let global_settings =
        GlobalSettingsView::from(sub_resources::get_or_create_global_settings(&state.db, user_id).await?);

    Ok(ExportBundle {
        books: exported_books,
        reading_fonts,
        global_settings,
    })
}

#[utoipa::path(get, path = "/api/export", tag = "export", responses((status = 200, body = ExportBundle)))]
pub async fn export(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bundle = build_export(&state, &user.id).await?;
    Ok(Data(bundle))
}

#[derive(Deserialize, ToSchema)]
pub struct ImportTheme {
    #[serde(rename = "coverBgStart")]
    pub cover_bg_start: Option<String>,
    #[serde(rename = "coverBgEnd")]
    pub cover_bg_end: Option<String>,
    #[serde(rename = "coverText")]
    pub cover_text: Option<String>,
    #[serde(rename = "coverBgImageUrl", default)]
    pub cover_bg_image_url: Option<String>,
    #[serde(rename = "pageTexture")]
    pub page_texture: Option<String>,
    #[serde(rename = "customTextureUrl", default)]
    pub custom_texture_url: Option<String>,
    #[serde(rename = "bgPage")]
    pub bg_page: Option<String>,
    #[serde(rename = "bgApp")]
    pub bg_app: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportAppearance {
    #[serde(rename = "fontMin")]
    pub font_min: Option<i32>,
    #[serde(rename = "fontMax")]
    pub font_max: Option<i32>,
    #[serde(default)]
    pub light: Option<ImportTheme>,
    #[serde(default)]
    pub dark: Option<ImportTheme>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ImportSounds {
    #[serde(rename = "pageFlip", default)]
    pub page_flip: Option<String>,
    #[serde(rename = "bookOpen", default)]
    pub book_open: Option<String>,
    #[serde(rename = "bookClose", default)]
    pub book_close: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ImportDefaultSettings {
    pub font: Option<String>,
    #[serde(rename = "fontSize")]
    pub font_size: Option<i32>,
    pub theme: Option<String>,
    #[serde(rename = "soundEnabled")]
    pub sound_enabled: Option<bool>,
    #[serde(rename = "soundVolume")]
    pub sound_volume: Option<f64>,
    #[serde(rename = "ambientType", default)]
    pub ambient_type: Option<String>,
    #[serde(rename = "ambientVolume")]
    pub ambient_volume: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportDecorativeFont {
    pub name: String,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportChapter {
    pub title: String,
    #[serde(rename = "htmlContent", default)]
    pub html_content: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportAmbient {
    #[serde(rename = "ambientKey")]
    pub ambient_key: String,
    pub label: String,
    #[serde(rename = "shortLabel", default)]
    pub short_label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "fileUrl", default)]
    pub file_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportBook {
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub visibility: Option<String>,
    #[serde(rename = "coverBgMode")]
    pub cover_bg_mode: Option<String>,
    #[serde(rename = "coverBgCustomUrl", default)]
    pub cover_bg_custom_url: Option<String>,
    #[serde(default)]
    pub appearance: Option<ImportAppearance>,
    #[serde(default)]
    pub sounds: Option<ImportSounds>,
    #[serde(rename = "defaultSettings", default)]
    pub default_settings: Option<ImportDefaultSettings>,
    #[serde(rename = "decorativeFont", default)]
    pub decorative_font: Option<ImportDecorativeFont>,
    #[serde(default)]
    pub chapters: Vec<ImportChapter>,
    #[serde(default)]
    pub ambients: Vec<ImportAmbient>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ImportReadingFont {
    #[serde(rename = "fontKey")]
    pub font_key: String,
    pub label: String,
    pub family: String,
    #[serde(rename = "fileUrl", default)]
    pub file_url: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct ImportGlobalSettings {
    #[serde(rename = "fontMin")]
    pub font_min: Option<i32>,
    #[serde(rename = "fontMax")]
    pub font_max: Option<i32>,
    #[serde(rename = "visibilityFontSize")]
    pub visibility_font_size: Option<bool>,
    #[serde(rename = "visibilityTheme")]
    pub visibility_theme: Option<bool>,
    #[serde(rename = "visibilityFont")]
    pub visibility_font: Option<bool>,
    #[serde(rename = "visibilityFullscreen")]
    pub visibility_fullscreen: Option<bool>,
    #[serde(rename = "visibilitySound")]
    pub visibility_sound: Option<bool>,
    #[serde(rename = "visibilityAmbient")]
    pub visibility_ambient: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportBundle {
    #[serde(default)]
    pub books: Vec<ImportBook>,
    #[serde(rename = "readingFonts", default)]
    pub reading_fonts: Vec<ImportReadingFont>,
    #[serde(default)]
    pub global_settings: Option<ImportGlobalSettings>,
}

/// Reconstructs one imported book (and its children) under `user_id`,
/// appending after whatever books already exist — `books::create` already
/// assigns the next position, so no explicit shift bookkeeping is needed.
/// Runs entirely on the caller's transaction: a failure partway through
/// (a bad chapter, a constraint violation) propagates up and the caller
/// rolls the whole import back rather than leaving a half-built book.
pub(crate) async fn import_one_book(
    tx: &mut sqlx::Transaction<'_, sqlx::Any>,
    user_id: &str,
    book: ImportBook,
) -> Result<(), AppError> {
    let bundle = books::create(&mut *tx, user_id, &book.title, &book.author).await?;
    let book_id = bundle.book.id;

    if book.visibility.is_some() || book.cover_bg_mode.is_some() || book.cover_bg_custom_url.is_some() {
        books::update(
            &mut *tx,
            &book_id,
            books::BookPatch {
                title: None,
                author: None,
                visibility: book.visibility,
                cover_bg_mode: book.cover_bg_mode,
                cover_bg_custom_url: book.cover_bg_custom_url.map(Some),
            },
            None,
        )
        .await?;
    }

    if let Some(appearance) = book.appearance {
        sub_resources::update_appearance_bounds(&mut *tx, &book_id, appearance.font_min, appearance.font_max)
            .await?;
        if let Some(light) = appearance.light {
            sub_resources::update_appearance_theme(
                &mut *tx,
                &book_id,
                "light",
                sub_resources::ThemePatch {
                    cover_bg_start: light.cover_bg_start,
                    cover_bg_end: light.cover_bg_end,
                    cover_text: light.cover_text,
                    cover_bg_image_url: Some(light.cover_bg_image_url),
                    page_texture: light.page_texture,
                    custom_texture_url: Some(light.custom_texture_url),
                    bg_page: light.bg_page,
                    bg_app: light.bg_app,
                },
            )
            .await?;
        }
        if let Some(dark) = appearance.dark {
            sub_resources::update_appearance_theme(
                &mut *tx,
                &book_id,
                "dark",
                sub_resources::ThemePatch {
                    cover_bg_start: dark.cover_bg_start,
                    cover_bg_end: dark.cover_bg_end,
                    cover_text: dark.cover_text,
                    cover_bg_image_url: Some(dark.cover_bg_image_url),
                    page_texture: dark.page_texture,
                    custom_texture_url: Some(dark.custom_texture_url),
                    bg_page: dark.bg_page,
                    bg_app: dark.bg_app,
                },
            )
            .await?;
        }
    }

    if let Some(sounds) = book.sounds {
        sub_resources::update_sounds(
            &mut *tx,
            &book_id,
            sub_resources::SoundsPatch {
                page_flip: Some(sounds.page_flip),
                book_open: Some(sounds.book_open),
                book_close: Some(sounds.book_close),
            },
        )
        .await?;
    }

    if let Some(settings) = book.default_settings {
        sub_resources::update_default_settings(
            &mut *tx,
            &book_id,
            sub_resources::DefaultSettingsPatch {
                font: settings.font,
                font_size: settings.font_size,
                theme: settings.theme,
                sound_enabled: settings.sound_enabled,
                sound_volume: settings.sound_volume,
                ambient_type: Some(settings.ambient_type),
                ambient_volume: settings.ambient_volume,
            },
        )
        .await?;
    }

    if let Some(font) = book.decorative_font {
        sub_resources::put_decorative_font(&mut *tx, &book_id, &font.name, &font.file_url).await?;
    }

    for chapter in book.chapters {
        let html_content = chapter.html_content.as_deref().map(sanitize);
        chapters::create(
            &mut *tx,
            &book_id,
            chapters::NewChapter {
                title: chapter.title,
                html_content,
                file_path: None,
            },
        )
        .await?;
    }

    for ambient in book.ambients {
        ambients::create(
            &mut *tx,
            &book_id,
            ambients::NewAmbient {
                ambient_key: ambient.ambient_key,
                label: ambient.label,
                short_label: ambient.short_label,
                icon: ambient.icon,
                file_url: ambient.file_url,
            },
        )
        .await?;
    }

    Ok(())
}

#[utoipa::path(post, path = "/api/import", tag = "export", request_body = ImportBundle, responses((status = 200, body = ExportBundle)))]
pub async fn import(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ImportBundle>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.db.begin().await?;

    for book in body.books {
        import_one_book(&mut tx, &user.id, book).await?;
    }

    reading_fonts::ensure_builtins_seeded(&mut *tx, &user.id).await?;
    for font in body.reading_fonts {
        reading_fonts::create(
            &mut *tx,
            &user.id,
            reading_fonts::NewReadingFont {
                font_key: font.font_key,
                label: font.label,
                family: font.family,
                file_url: font.file_url,
            },
        )
        .await?;
    }

    if let Some(settings) = body.global_settings {
        sub_resources::update_global_settings(
            &mut *tx,
            &user.id,
            sub_resources::GlobalSettingsPatch {
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

    let bundle = build_export(&state, &user.id).await?;
    Ok(Data(bundle))
}
