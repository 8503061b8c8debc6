use crate::db::DbPool;
use crate::db::models::{BUILTIN_READING_FONTS, ReadingFont, new_id, now_ms};

pub async fn get<'e, E>(executor: E, id: &str) -> Result<Option<ReadingFont>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, ReadingFont>("SELECT * FROM reading_fonts WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_for_user<'e, E>(executor: E, user_id: &str) -> Result<Vec<ReadingFont>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, ReadingFont>(
        "SELECT * FROM reading_fonts WHERE user_id = ? ORDER BY position",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Seeds the builtin reading fonts for a new user on first access.
/// Idempotent — a user who already has any reading fonts is left
/// untouched. Accepts either a bare pool or an already-open transaction
/// so it can be folded into the caller's transaction (import/migration).
pub async fn ensure_builtins_seeded<'a, A>(conn: A, user_id: &str) -> Result<(), sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let existing = list_for_user(&mut *conn, user_id).await?;
    if !existing.is_empty() {
        return Ok(());
    }
    let now = now_ms();
    for (position, (font_key, label, family)) in BUILTIN_READING_FONTS.iter().enumerate() {
        sqlx::query(
            "INSERT INTO reading_fonts (id, user_id, font_key, label, family, builtin, enabled, position, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 1, 1, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(user_id)
        .bind(font_key)
        .bind(label)
        .bind(family)
        .bind(position as i64)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn next_position<'e, E>(executor: E, user_id: &str) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT MAX(position) FROM reading_fonts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.map(|p| p + 1).unwrap_or(0))
}

pub struct NewReadingFont {
    pub font_key: String,
    pub label: String,
    pub family: String,
    pub file_url: Option<String>,
}

/// Accepts either a bare pool or an already-open transaction, so it can
/// be folded into the caller's transaction (import/migration) instead
/// of always committing on its own.
pub async fn create<'a, A>(conn: A, user_id: &str, new: NewReadingFont) -> Result<ReadingFont, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let position = next_position(&mut *conn, user_id).await?;
    let id = new_id();
    let now = now_ms();
    sqlx::query(
        "INSERT INTO reading_fonts (id, user_id, font_key, label, family, builtin, enabled, file_url, position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 0, 1, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(&new.font_key)
    .bind(&new.label)
    .bind(&new.family)
    .bind(&new.file_url)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(get(&mut *conn, &id).await?.expect("just inserted"))
}

#[derive(Default)]
pub struct ReadingFontPatch {
    pub label: Option<String>,
    pub enabled: Option<bool>,
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    patch: ReadingFontPatch,
) -> Result<Option<ReadingFont>, sqlx::Error> {
    let Some(existing) = get(pool, id).await? else {
        return Ok(None);
    };
    let label = patch.label.unwrap_or(existing.label);
    let enabled = patch.enabled.unwrap_or(existing.enabled);
    sqlx::query("UPDATE reading_fonts SET label = ?, enabled = ?, updated_at = ? WHERE id = ?")
        .bind(&label)
        .bind(enabled)
        .bind(now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    get(pool, id).await
}

/// Deletes a non-builtin reading font. Builtin rows cannot be deleted,
/// only toggled — callers must check `builtin` first.
pub async fn delete(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM reading_fonts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn reorder(
    pool: &DbPool,
    user_id: &str,
    ordered_ids: &[String],
) -> Result<bool, sqlx::Error> {
    let live = list_for_user(pool, user_id).await?;
    let mut live_ids: Vec<&str> = live.iter().map(|f| f.id.as_str()).collect();
    live_ids.sort_unstable();
    let mut given: Vec<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
    given.sort_unstable();
    if live_ids != given {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    let now = now_ms();
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query(
            "UPDATE reading_fonts SET position = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(position as i64)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(true)
}
