//! Query helpers for the 1:1-with-Book and 1:1-with-User sub-resources:
//! BookAppearance, BookSounds, BookDefaultSettings, DecorativeFont,
//! GlobalSettings. Each follows the same get/update shape; kept in one
//! module since none of them are independently listable or orderable.

use crate::db::DbPool;
use crate::db::models::{
    BookAppearance, BookDefaultSettings, BookSounds, DecorativeFont, GlobalSettings, now_ms,
};

pub async fn get_appearance<'e, E>(
    executor: E,
    book_id: &str,
) -> Result<Option<BookAppearance>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, BookAppearance>("SELECT * FROM book_appearance WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(executor)
        .await
}

pub struct ThemePatch {
    pub cover_bg_start: Option<String>,
    pub cover_bg_end: Option<String>,
    pub cover_text: Option<String>,
    pub cover_bg_image_url: Option<Option<String>>,
    pub page_texture: Option<String>,
    pub custom_texture_url: Option<Option<String>>,
    pub bg_page: Option<String>,
    pub bg_app: Option<String>,
}

impl Default for ThemePatch {
    fn default() -> Self {
        ThemePatch {
            cover_bg_start: None,
            cover_bg_end: None,
            cover_text: None,
            cover_bg_image_url: None,
            page_texture: None,
            custom_texture_url: None,
            bg_page: None,
            bg_app: None,
        }
    }
}

/// Updates only one theme (`light` or `dark`) of a book's appearance,
/// leaving font bounds and the other theme untouched
/// (`PATCH /books/:bookId/appearance/:theme`). Accepts either a bare
/// pool or an already-open transaction, so it can be folded into the
/// caller's transaction (import/migration) instead of always committing
/// on its own.
pub async fn update_appearance_theme<'a, A>(
    conn: A,
    book_id: &str,
    theme: &str,
    patch: ThemePatch,
) -> Result<Option<BookAppearance>, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let Some(existing) = get_appearance(&mut *conn, book_id).await? else {
        return Ok(None);
    };
    let now = now_ms();

    if theme == "dark" {
        sqlx::query(
            "UPDATE book_appearance SET dark_cover_bg_start = ?, dark_cover_bg_end = ?, \
             dark_cover_text = ?, dark_cover_bg_image_url = ?, dark_page_texture = ?, \
             dark_custom_texture_url = ?, dark_bg_page = ?, dark_bg_app = ?, updated_at = ? \
             WHERE book_id = ?",
        )
        .bind(patch.cover_bg_start.unwrap_or(existing.dark_cover_bg_start))
        .bind(patch.cover_bg_end.unwrap_or(existing.dark_cover_bg_end))
        .bind(patch.cover_text.unwrap_or(existing.dark_cover_text))
        .bind(patch.cover_bg_image_url.unwrap_or(existing.dark_cover_bg_image_url))
        .bind(patch.page_texture.unwrap_or(existing.dark_page_texture))
        .bind(patch.custom_texture_url.unwrap_or(existing.dark_custom_texture_url))
        .bind(patch.bg_page.unwrap_or(existing.dark_bg_page))
        .bind(patch.bg_app.unwrap_or(existing.dark_bg_app))
        .bind(now)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    } else {
        sqlx::query(
            "UPDATE book_appearance SET light_cover_bg_start = ?, light_cover_bg_end = ?, \
             light_cover_text = ?, light_cover_bg_image_url = ?, light_page_texture = ?, \
             light_custom_texture_url = ?, light_bg_page = ?, light_bg_app = ?, updated_at = ? \
             WHERE book_id = ?",
        )
        .bind(patch.cover_bg_start.unwrap_or(existing.light_cover_bg_start))
        .bind(patch.cover_bg_end.unwrap_or(existing.light_cover_bg_end))
        .bind(patch.cover_text.unwrap_or(existing.light_cover_text))
        .bind(patch.cover_bg_image_url.unwrap_or(existing.light_cover_bg_image_url))
        .bind(patch.page_texture.unwrap_or(existing.light_page_texture))
        .bind(patch.custom_texture_url.unwrap_or(existing.light_custom_texture_url))
        .bind(patch.bg_page.unwrap_or(existing.light_bg_page))
        .bind(patch.bg_app.unwrap_or(existing.light_bg_app))
        .bind(now)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    }

    get_appearance(&mut *conn, book_id).await
}

/// Updates the shared font-size bounds on an appearance row
/// (`PATCH /books/:bookId/appearance`, the non-theme-scoped fields).
pub async fn update_appearance_bounds<'a, A>(
    conn: A,
    book_id: &str,
    font_min: Option<i32>,
    font_max: Option<i32>,
) -> Result<Option<BookAppearance>, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let Some(existing) = get_appearance(&mut *conn, book_id).await? else {
        return Ok(None);
    };
    let font_min = font_min.unwrap_or(existing.font_min);
    let font_max = font_max.unwrap_or(existing.font_max);
    sqlx::query("UPDATE book_appearance SET font_min = ?, font_max = ?, updated_at = ? WHERE book_id = ?")
        .bind(font_min)
        .bind(font_max)
        .bind(now_ms())
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    get_appearance(&mut *conn, book_id).await
}

pub async fn get_sounds<'e, E>(executor: E, book_id: &str) -> Result<Option<BookSounds>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, BookSounds>("SELECT * FROM book_sounds WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(executor)
        .await
}

pub struct SoundsPatch {
    pub page_flip: Option<Option<String>>,
    pub book_open: Option<Option<String>>,
    pub book_close: Option<Option<String>>,
}

pub async fn update_sounds<'a, A>(
    conn: A,
    book_id: &str,
    patch: SoundsPatch,
) -> Result<Option<BookSounds>, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let Some(existing) = get_sounds(&mut *conn, book_id).await? else {
        return Ok(None);
    };
    let page_flip = patch.page_flip.unwrap_or(existing.page_flip);
    let book_open = patch.book_open.unwrap_or(existing.book_open);
    let book_close = patch.book_close.unwrap_or(existing.book_close);
    sqlx::query(
        "UPDATE book_sounds SET page_flip = ?, book_open = ?, book_close = ?, updated_at = ? WHERE book_id = ?",
    )
    .bind(&page_flip)
    .bind(&book_open)
    .bind(&book_close)
    .bind(now_ms())
    .bind(book_id)
    .execute(&mut *conn)
    .await?;
    get_sounds(&mut *conn, book_id).await
}

pub async fn get_default_settings<'e, E>(
    executor: E,
    book_id: &str,
) -> Result<Option<BookDefaultSettings>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, BookDefaultSettings>("SELECT * FROM book_default_settings WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(executor)
        .await
}

#[derive(Default)]
pub struct DefaultSettingsPatch {
    pub font: Option<String>,
    pub font_size: Option<i32>,
    pub theme: Option<String>,
    pub sound_enabled: Option<bool>,
    pub sound_volume: Option<f64>,
    pub ambient_type: Option<Option<String>>,
    pub ambient_volume: Option<f64>,
}

pub async fn update_default_settings<'a, A>(
    conn: A,
    book_id: &str,
    patch: DefaultSettingsPatch,
) -> Result<Option<BookDefaultSettings>, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let Some(existing) = get_default_settings(&mut *conn, book_id).await? else {
        return Ok(None);
    };
    let font = patch.font.unwrap_or(existing.font);
    let font_size = patch.font_size.unwrap_or(existing.font_size);
    let theme = patch.theme.unwrap_or(existing.theme);
    let sound_enabled = patch.sound_enabled.unwrap_or(existing.sound_enabled);
    let sound_volume = patch.sound_volume.unwrap_or(existing.sound_volume);
    let ambient_type = patch.ambient_type.unwrap_or(existing.ambient_type);
    let ambient_volume = patch.ambient_volume.unwrap_or(existing.ambient_volume);

    sqlx::query(
        "UPDATE book_default_settings SET font = ?, font_size = ?, theme = ?, sound_enabled = ?, \
         sound_volume = ?, ambient_type = ?, ambient_volume = ?, updated_at = ? WHERE book_id = ?",
    )
    .bind(&font)
    .bind(font_size)
    .bind(&theme)
    .bind(sound_enabled)
    .bind(sound_volume)
    .bind(&ambient_type)
    .bind(ambient_volume)
    .bind(now_ms())
    .bind(book_id)
    .execute(&mut *conn)
    .await?;
    get_default_settings(&mut *conn, book_id).await
}

pub async fn get_decorative_font<'e, E>(
    executor: E,
    book_id: &str,
) -> Result<Option<DecorativeFont>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, DecorativeFont>("SELECT * FROM decorative_fonts WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(executor)
        .await
}

/// `PUT` replaces the whole (0..1 cardinality) decorative font row.
pub async fn put_decorative_font<'a, A>(
    conn: A,
    book_id: &str,
    name: &str,
    file_url: &str,
) -> Result<DecorativeFont, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let now = now_ms();
    let existing = get_decorative_font(&mut *conn, book_id).await?;
    if existing.is_some() {
        sqlx::query(
            "UPDATE decorative_fonts SET name = ?, file_url = ?, updated_at = ? WHERE book_id = ?",
        )
        .bind(name)
        .bind(file_url)
        .bind(now)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    } else {
        sqlx::query(
            "INSERT INTO decorative_fonts (book_id, name, file_url, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(book_id)
        .bind(name)
        .bind(file_url)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(get_decorative_font(&mut *conn, book_id)
        .await?
        .expect("just upserted"))
}

pub async fn delete_decorative_font(pool: &DbPool, book_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM decorative_fonts WHERE book_id = ?")
        .bind(book_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_global_settings<'e, E>(
    executor: E,
    user_id: &str,
) -> Result<Option<GlobalSettings>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, GlobalSettings>("SELECT * FROM global_settings WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Creates the default GlobalSettings row for a user on first access —
/// the row is not created atomically with the user because it has no
/// fields a client must supply up front.
pub async fn get_or_create_global_settings<'a, A>(
    conn: A,
    user_id: &str,
) -> Result<GlobalSettings, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    if let Some(existing) = get_global_settings(&mut *conn, user_id).await? {
        return Ok(existing);
    }
    sqlx::query("INSERT INTO global_settings (user_id, updated_at) VALUES (?, ?)")
        .bind(user_id)
        .bind(now_ms())
        .execute(&mut *conn)
        .await?;
    Ok(get_global_settings(&mut *conn, user_id)
        .await?
        .expect("just inserted"))
}

#[derive(Default)]
pub struct GlobalSettingsPatch {
    pub font_min: Option<i32>,
    pub font_max: Option<i32>,
    pub visibility_font_size: Option<bool>,
    pub visibility_theme: Option<bool>,
    pub visibility_font: Option<bool>,
    pub visibility_fullscreen: Option<bool>,
    pub visibility_sound: Option<bool>,
    pub visibility_ambient: Option<bool>,
}

pub async fn update_global_settings<'a, A>(
    conn: A,
    user_id: &str,
    patch: GlobalSettingsPatch,
) -> Result<GlobalSettings, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let existing = get_or_create_global_settings(&mut *conn, user_id).await?;
    let font_min = patch.font_min.unwrap_or(existing.font_min);
    let font_max = patch.font_max.unwrap_or(existing.font_max);
    let visibility_font_size = patch
        .visibility_font_size
        .unwrap_or(existing.visibility_font_size);
    let visibility_theme = patch.visibility_theme.unwrap_or(existing.visibility_theme);
    let visibility_font = patch.visibility_font.unwrap_or(existing.visibility_font);
    let visibility_fullscreen = patch
        .visibility_fullscreen
        .unwrap_or(existing.visibility_fullscreen);
    let visibility_sound = patch.visibility_sound.unwrap_or(existing.visibility_sound);
    let visibility_ambient = patch
        .visibility_ambient
        .unwrap_or(existing.visibility_ambient);

    sqlx::query(
        "UPDATE global_settings SET font_min = ?, font_max = ?, visibility_font_size = ?, \
         visibility_theme = ?, visibility_font = ?, visibility_fullscreen = ?, \
         visibility_sound = ?, visibility_ambient = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(font_min)
    .bind(font_max)
    .bind(visibility_font_size)
    .bind(visibility_theme)
    .bind(visibility_font)
    .bind(visibility_fullscreen)
    .bind(visibility_sound)
    .bind(visibility_ambient)
    .bind(now_ms())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(get_global_settings(&mut *conn, user_id)
        .await?
        .expect("just updated"))
}
