use crate::db::models::{ReadingProgress, now_ms};
use crate::db::{DbBackend, DbPool};

pub async fn get(
    pool: &DbPool,
    user_id: &str,
    book_id: &str,
) -> Result<Option<ReadingProgress>, sqlx::Error> {
    sqlx::query_as::<_, ReadingProgress>(
        "SELECT * FROM reading_progress WHERE user_id = ? AND book_id = ?",
    )
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await
}

pub struct ProgressSnapshot {
    pub page: i32,
    pub font: Option<String>,
    pub font_size: Option<i32>,
    pub theme: Option<String>,
    pub sound_enabled: bool,
    pub sound_volume: f64,
    pub ambient_type: Option<String>,
    pub ambient_volume: f64,
}

/// Upserts the caller's progress row for a book. Last-write-wins: the
/// incoming snapshot always replaces whatever is stored, with no merge
/// logic.
pub async fn upsert(
    pool: &DbPool,
    backend: DbBackend,
    user_id: &str,
    book_id: &str,
    snapshot: ProgressSnapshot,
) -> Result<ReadingProgress, sqlx::Error> {
    let now = now_ms();
    let sql = match backend {
        DbBackend::Mysql => {
            "INSERT INTO reading_progress (user_id, book_id, page, font, font_size, theme, \
             sound_enabled, sound_volume, ambient_type, ambient_volume, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE page = VALUES(page), font = VALUES(font), \
             font_size = VALUES(font_size), theme = VALUES(theme), \
             sound_enabled = VALUES(sound_enabled), sound_volume = VALUES(sound_volume), \
             ambient_type = VALUES(ambient_type), ambient_volume = VALUES(ambient_volume), \
             updated_at = VALUES(updated_at)"
        }
        _ => {
            "INSERT INTO reading_progress (user_id, book_id, page, font, font_size, theme, \
             sound_enabled, sound_volume, ambient_type, ambient_volume, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(user_id, book_id) DO UPDATE SET page = excluded.page, \
             font = excluded.font, font_size = excluded.font_size, theme = excluded.theme, \
             sound_enabled = excluded.sound_enabled, sound_volume = excluded.sound_volume, \
             ambient_type = excluded.ambient_type, ambient_volume = excluded.ambient_volume, \
             updated_at = excluded.updated_at"
        }
    };

    sqlx::query(sql)
        .bind(user_id)
        .bind(book_id)
        .bind(snapshot.page)
        .bind(&snapshot.font)
        .bind(snapshot.font_size)
        .bind(&snapshot.theme)
        .bind(snapshot.sound_enabled)
        .bind(snapshot.sound_volume)
        .bind(&snapshot.ambient_type)
        .bind(snapshot.ambient_volume)
        .bind(now)
        .execute(pool)
        .await?;

    Ok(get(pool, user_id, book_id).await?.expect("just upserted"))
}
