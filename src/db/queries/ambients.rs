use crate::db::DbPool;
use crate::db::models::{Ambient, new_id, now_ms};

pub async fn get<'e, E>(executor: E, id: &str) -> Result<Option<Ambient>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, Ambient>("SELECT * FROM ambients WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_for_book(pool: &DbPool, book_id: &str) -> Result<Vec<Ambient>, sqlx::Error> {
    sqlx::query_as::<_, Ambient>("SELECT * FROM ambients WHERE book_id = ? ORDER BY position")
        .bind(book_id)
        .fetch_all(pool)
        .await
}

async fn next_position<'e, E>(executor: E, book_id: &str) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT MAX(position) FROM ambients WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.map(|p| p + 1).unwrap_or(0))
}

pub struct NewAmbient {
    pub ambient_key: String,
    pub label: String,
    pub short_label: Option<String>,
    pub icon: Option<String>,
    pub file_url: Option<String>,
}

/// Accepts either a bare pool or an already-open transaction, so it can
/// be folded into the caller's transaction (import/migration) instead
/// of always committing on its own.
pub async fn create<'a, A>(conn: A, book_id: &str, new: NewAmbient) -> Result<Ambient, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let position = next_position(&mut *conn, book_id).await?;
    let id = new_id();
    let now = now_ms();
    sqlx::query(
        "INSERT INTO ambients (id, book_id, ambient_key, label, short_label, icon, file_url, \
         visible, builtin, position, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0, ?, ?, ?)",
    )
    .bind(&id)
    .bind(book_id)
    .bind(&new.ambient_key)
    .bind(&new.label)
    .bind(&new.short_label)
    .bind(&new.icon)
    .bind(&new.file_url)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(get(&mut *conn, &id).await?.expect("just inserted"))
}

#[derive(Default)]
pub struct AmbientPatch {
    pub label: Option<String>,
    pub short_label: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub file_url: Option<Option<String>>,
    pub visible: Option<bool>,
}

pub async fn update(
    pool: &DbPool,
    id: &str,
    patch: AmbientPatch,
) -> Result<Option<Ambient>, sqlx::Error> {
    let Some(existing) = get(pool, id).await? else {
        return Ok(None);
    };
    let label = patch.label.unwrap_or(existing.label);
    let short_label = patch.short_label.unwrap_or(existing.short_label);
    let icon = patch.icon.unwrap_or(existing.icon);
    let file_url = patch.file_url.unwrap_or(existing.file_url);
    let visible = patch.visible.unwrap_or(existing.visible);

    sqlx::query(
        "UPDATE ambients SET label = ?, short_label = ?, icon = ?, file_url = ?, visible = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&label)
    .bind(&short_label)
    .bind(&icon)
    .bind(&file_url)
    .bind(visible)
    .bind(now_ms())
    .bind(id)
    .execute(pool)
    .await?;
    get(pool, id).await
}

/// Deletes a non-builtin ambient. Builtin rows can only be toggled,
/// so callers must check `builtin` first.
pub async fn delete(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM ambients WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn reorder(
    pool: &DbPool,
    book_id: &str,
    ordered_ids: &[String],
) -> Result<bool, sqlx::Error> {
    let live = list_for_book(pool, book_id).await?;
    let mut live_ids: Vec<&str> = live.iter().map(|a| a.id.as_str()).collect();
    live_ids.sort_unstable();
    let mut given: Vec<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
    given.sort_unstable();
    if live_ids != given {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    let now = now_ms();
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE ambients SET position = ?, updated_at = ? WHERE id = ? AND book_id = ?")
            .bind(position as i64)
            .bind(now)
            .bind(id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(true)
}
