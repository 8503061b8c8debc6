use crate::db::DbPool;
use crate::db::models::{Chapter, new_id, now_ms};

pub async fn get<'e, E>(executor: E, id: &str) -> Result<Option<Chapter>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Fetches a chapter, only if it belongs to the given (still-live) book —
/// used so a soft-deleted book's children read as 404 even though the
/// rows still physically exist.
pub async fn get_in_live_book(
    pool: &DbPool,
    book_id: &str,
    chapter_id: &str,
) -> Result<Option<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(
        "SELECT c.* FROM chapters c JOIN books b ON b.id = c.book_id \
         WHERE c.id = ? AND c.book_id = ? AND b.deleted_at IS NULL",
    )
    .bind(chapter_id)
    .bind(book_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_for_book(pool: &DbPool, book_id: &str) -> Result<Vec<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE book_id = ? ORDER BY position")
        .bind(book_id)
        .fetch_all(pool)
        .await
}

async fn next_position<'e, E>(executor: E, book_id: &str) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT MAX(position) FROM chapters WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.map(|p| p + 1).unwrap_or(0))
}

pub struct NewChapter {
    pub title: String,
    pub html_content: Option<String>,
    pub file_path: Option<String>,
}

/// Accepts either a bare pool or an already-open transaction, so it can
/// be folded into the caller's transaction (import/migration) instead
/// of always committing on its own.
pub async fn create<'a, A>(conn: A, book_id: &str, new: NewChapter) -> Result<Chapter, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;
    let position = next_position(&mut *conn, book_id).await?;
    let id = new_id();
    let now = now_ms();
    sqlx::query(
        "INSERT INTO chapters (id, book_id, title, position, file_path, html_content, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(book_id)
    .bind(&new.title)
    .bind(position)
    .bind(&new.file_path)
    .bind(&new.html_content)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(get(&mut *conn, &id).await?.expect("just inserted"))
}

pub struct ChapterPatch {
    pub title: Option<String>,
    pub html_content: Option<String>,
    pub bg: Option<Option<String>>,
    pub bg_mobile: Option<Option<String>>,
}

pub enum UpdateOutcome {
    Updated(Chapter),
    NotFound,
    Conflict,
}

/// `if_unmodified_since` enforces optimistic concurrency via a single
/// conditional `UPDATE` gated on the row's current `updated_at`, so a
/// conflict is decided by the write itself (rows affected), not by a
/// separate read-then-compare that a racing request could slip past.
pub async fn update<'a, A>(
    conn: A,
    id: &str,
    patch: ChapterPatch,
    if_unmodified_since: Option<i64>,
) -> Result<UpdateOutcome, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;

    let Some(existing) = get(&mut *conn, id).await? else {
        return Ok(UpdateOutcome::NotFound);
    };

    let title = patch.title.unwrap_or(existing.title);
    // Setting htmlContent makes it the source of truth; file_path is cleared.
    let (html_content, file_path) = match patch.html_content {
        Some(html) => (Some(html), None),
        None => (existing.html_content, existing.file_path),
    };
    let bg = patch.bg.unwrap_or(existing.bg);
    let bg_mobile = patch.bg_mobile.unwrap_or(existing.bg_mobile);
    let now = now_ms();
    let guard = if_unmodified_since.unwrap_or(i64::MAX);

    let result = sqlx::query(
        "UPDATE chapters SET title = ?, html_content = ?, file_path = ?, bg = ?, bg_mobile = ?, updated_at = ? \
         WHERE id = ? AND updated_at <= ?",
    )
    .bind(&title)
    .bind(&html_content)
    .bind(&file_path)
    .bind(&bg)
    .bind(&bg_mobile)
    .bind(now)
    .bind(id)
    .bind(guard)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(match get(&mut *conn, id).await? {
            Some(_) => UpdateOutcome::Conflict,
            None => UpdateOutcome::NotFound,
        });
    }

    Ok(UpdateOutcome::Updated(
        get(&mut *conn, id).await?.expect("just updated"),
    ))
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM chapters WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Renumbers a book's chapters to the dense `0..n-1` sequence given by
/// `ordered_ids`. Returns `false` if the set doesn't match the book's
/// current children exactly.
pub async fn reorder(
    pool: &DbPool,
    book_id: &str,
    ordered_ids: &[String],
) -> Result<bool, sqlx::Error> {
    let live = list_for_book(pool, book_id).await?;
    let mut live_ids: Vec<&str> = live.iter().map(|c| c.id.as_str()).collect();
    live_ids.sort_unstable();
    let mut given: Vec<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
    given.sort_unstable();
    if live_ids != given {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    let now = now_ms();
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE chapters SET position = ?, updated_at = ? WHERE id = ? AND book_id = ?")
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
