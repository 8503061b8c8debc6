//! Password reset tokens (`POST /auth/forgot-password`,
//! `POST /auth/reset-password`). Single-use, short-lived.

use crate::db::DbPool;
use crate::db::models::{new_id, now_ms};

pub struct PasswordResetToken {
    pub id: String,
    pub user_id: String,
    pub expires_at: i64,
    pub consumed_at: Option<i64>,
    pub created_at: i64,
}

const TTL_SECS: i64 = 60 * 60;

pub async fn create(pool: &DbPool, user_id: &str) -> Result<PasswordResetToken, sqlx::Error> {
    let id = new_id();
    let now = now_ms();
    let expires_at = now + TTL_SECS * 1000;
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(PasswordResetToken {
        id,
        user_id: user_id.to_string(),
        expires_at,
        consumed_at: None,
        created_at: now,
    })
}

/// Looks up a token, returning `None` if absent, expired, or already used.
pub async fn get_live(pool: &DbPool, id: &str) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    let row: Option<(String, String, i64, Option<i64>, i64)> = sqlx::query_as(
        "SELECT id, user_id, expires_at, consumed_at, created_at FROM password_reset_tokens WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .map(|(id, user_id, expires_at, consumed_at, created_at)| PasswordResetToken {
            id,
            user_id,
            expires_at,
            consumed_at,
            created_at,
        })
        .filter(|t| t.consumed_at.is_none() && t.expires_at > now_ms()))
}

pub async fn consume(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE password_reset_tokens SET consumed_at = ? WHERE id = ?")
        .bind(now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
