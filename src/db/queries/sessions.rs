use crate::db::DbPool;
use crate::db::models::{Session, new_id, now_ms};

pub async fn create(pool: &DbPool, user_id: &str, ttl_secs: u64) -> Result<Session, sqlx::Error> {
    let id = new_id();
    let now = now_ms();
    let expires_at = now + (ttl_secs as i64) * 1000;

    sqlx::query(
        "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Session {
        id,
        user_id: user_id.to_string(),
        expires_at,
        created_at: now,
    })
}

/// Looks up a session by id, returning `None` if absent or expired.
/// Expired rows are left for the caller's logout/cleanup path rather than
/// deleted inline, keeping this a pure read.
pub async fn get_live(pool: &DbPool, id: &str) -> Result<Option<Session>, sqlx::Error> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(session.filter(|s| s.expires_at > now_ms()))
}

pub async fn delete(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Destroys every session belonging to a user (full logout-everywhere).
pub async fn delete_all_for_user(pool: &DbPool, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
