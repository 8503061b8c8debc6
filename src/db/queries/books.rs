use crate::db::DbPool;
use crate::db::models::{
    Ambient, Book, BookAppearance, BookDefaultSettings, BookSounds, new_id, now_ms,
};

/// Every row a freshly created Book owns atomically.
pub struct NewBookBundle {
    pub book: Book,
    pub appearance: BookAppearance,
    pub sounds: BookSounds,
    pub default_settings: BookDefaultSettings,
}

pub async fn get_live<'e, E>(executor: E, id: &str) -> Result<Option<Book>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ? AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Fetches a book regardless of soft-delete state, for the export path:
/// soft-delete masks children from reads without physically removing
/// them, preserving export fidelity in the admin path.
pub async fn get_any<'e, E>(executor: E, id: &str) -> Result<Option<Book>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        "SELECT * FROM books WHERE user_id = ? AND deleted_at IS NULL ORDER BY position",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all_for_user(pool: &DbPool, user_id: &str) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE user_id = ? ORDER BY position")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Flat paginated list of published books across all users, for the
/// unauthenticated discover feed (`/public/discover`).
pub async fn list_published(pool: &DbPool, limit: i64) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        "SELECT * FROM books WHERE deleted_at IS NULL AND visibility = 'published' \
         ORDER BY updated_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

async fn next_position<'e, E>(executor: E, user_id: &str) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Any>,
{
    let row: (Option<i64>,) =
        sqlx::query_as("SELECT MAX(position) FROM books WHERE user_id = ? AND deleted_at IS NULL")
            .bind(user_id)
            .fetch_one(executor)
            .await?;
    Ok(row.0.map(|p| p + 1).unwrap_or(0))
}

/// Creates a Book together with its Appearance/Sounds/DefaultSettings rows
/// in a single transaction. Accepts either a bare pool (opens its own
/// top-level transaction) or an already-open transaction (nests inside
/// it via savepoint), so callers like import/migrate can fold book
/// creation into one outer all-or-nothing transaction.
pub async fn create<'a, A>(
    conn: A,
    user_id: &str,
    title: &str,
    author: &str,
) -> Result<NewBookBundle, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut tx = conn.begin().await?;

    let position = next_position(&mut *tx, user_id).await?;
    let id = new_id();
    let now = now_ms();
    sqlx::query(
        "INSERT INTO books (id, user_id, title, author, position, visibility, cover_bg_mode, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, 'draft', 'default', ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(author)
    .bind(position)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO book_appearance (book_id, updated_at) VALUES (?, ?)")
        .bind(&id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO book_sounds (book_id, updated_at) VALUES (?, ?)")
        .bind(&id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO book_default_settings (book_id, updated_at) VALUES (?, ?)")
        .bind(&id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    let book = get_any(&mut *tx, &id).await?.expect("just inserted");
    let appearance = crate::db::queries::sub_resources::get_appearance(&mut *tx, &id)
        .await?
        .expect("just inserted");
    let sounds = crate::db::queries::sub_resources::get_sounds(&mut *tx, &id)
        .await?
        .expect("just inserted");
    let default_settings = crate::db::queries::sub_resources::get_default_settings(&mut *tx, &id)
        .await?
        .expect("just inserted");

    tx.commit().await?;

    Ok(NewBookBundle {
        book,
        appearance,
        sounds,
        default_settings,
    })
}

pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub visibility: Option<String>,
    pub cover_bg_mode: Option<String>,
    pub cover_bg_custom_url: Option<Option<String>>,
}

/// Applies a partial update to a book, returning the new row.
/// `if_unmodified_since` enforces optimistic concurrency: the write
/// itself is a single conditional `UPDATE` gated on the row's current
/// `updated_at`, so two concurrent stale patches can't both silently
/// succeed — whichever commits second finds zero rows affected and is
/// reported back as a conflict rather than clobbering the first.
pub async fn update<'a, A>(
    conn: A,
    id: &str,
    patch: BookPatch,
    if_unmodified_since: Option<i64>,
) -> Result<UpdateOutcome, sqlx::Error>
where
    A: sqlx::Acquire<'a, Database = sqlx::Any>,
{
    let mut conn = conn.acquire().await?;

    let Some(existing) = get_live(&mut *conn, id).await? else {
        return Ok(UpdateOutcome::NotFound);
    };

    let title = patch.title.unwrap_or(existing.title);
    let author = patch.author.unwrap_or(existing.author);
    let visibility = patch.visibility.unwrap_or(existing.visibility);
    let cover_bg_mode = patch.cover_bg_mode.unwrap_or(existing.cover_bg_mode);
    let cover_bg_custom_url = patch
        .cover_bg_custom_url
        .unwrap_or(existing.cover_bg_custom_url);
    let now = now_ms();
    let guard = if_unmodified_since.unwrap_or(i64::MAX);

    let result = sqlx::query(
        "UPDATE books SET title = ?, author = ?, visibility = ?, cover_bg_mode = ?, \
         cover_bg_custom_url = ?, updated_at = ? \
         WHERE id = ? AND deleted_at IS NULL AND updated_at <= ?",
    )
    .bind(&title)
    .bind(&author)
    .bind(&visibility)
    .bind(&cover_bg_mode)
    .bind(&cover_bg_custom_url)
    .bind(now)
    .bind(id)
    .bind(guard)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // The row either vanished or its updated_at moved past `guard`
        // since the read above; tell the two apart with one more read
        // on the same connection rather than trusting that read.
        return Ok(match get_live(&mut *conn, id).await? {
            Some(_) => UpdateOutcome::Conflict,
            None => UpdateOutcome::NotFound,
        });
    }

    Ok(UpdateOutcome::Updated(
        get_live(&mut *conn, id).await?.expect("just updated"),
    ))
}

pub enum UpdateOutcome {
    Updated(Book),
    NotFound,
    Conflict,
}

pub async fn soft_delete(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE books SET deleted_at = ?, updated_at = ? WHERE id = ?")
        .bind(now_ms())
        .bind(now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Renumbers a user's live books to the dense `0..n-1` sequence given by
/// `ordered_ids`, inside a single transaction. Returns
/// `false` if `ordered_ids` is not exactly the set of live book ids.
pub async fn reorder(
    pool: &DbPool,
    user_id: &str,
    ordered_ids: &[String],
) -> Result<bool, sqlx::Error> {
    let live = list_for_user(pool, user_id).await?;
    let mut live_ids: Vec<&str> = live.iter().map(|b| b.id.as_str()).collect();
    live_ids.sort_unstable();
    let mut given: Vec<&str> = ordered_ids.iter().map(|s| s.as_str()).collect();
    given.sort_unstable();
    if live_ids != given {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    let now = now_ms();
    for (position, id) in ordered_ids.iter().enumerate() {
        sqlx::query("UPDATE books SET position = ?, updated_at = ? WHERE id = ? AND user_id = ?")
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

/// Returns every Ambient row for a book, ordered.
pub async fn list_ambients(pool: &DbPool, book_id: &str) -> Result<Vec<Ambient>, sqlx::Error> {
    sqlx::query_as::<_, Ambient>("SELECT * FROM ambients WHERE book_id = ? ORDER BY position")
        .bind(book_id)
        .fetch_all(pool)
        .await
}
