use crate::db::DbPool;
use crate::db::models::{User, now_ms};

/// Look up a user by email, case-insensitively, as the unique constraint
/// requires: email is unique case-insensitively ("ci-folded").
pub async fn get_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower(?)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_id(pool: &DbPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Create a new user. `password_hash` is `None` for OAuth-only accounts.
pub async fn create(
    pool: &DbPool,
    email: &str,
    password_hash: Option<&str>,
) -> Result<User, sqlx::Error> {
    let id = crate::db::models::new_id();
    let now = now_ms();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(User {
        id,
        email: email.to_string(),
        password_hash: password_hash.map(|s| s.to_string()),
        display_name: None,
        username: None,
        bio: None,
        avatar_url: None,
        created_at: now,
        updated_at: now,
    })
}

pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// Applies a partial profile update, merging `None` fields as "leave
/// unchanged" rather than "clear" — the PATCH body only carries the fields
/// the client actually sent.
pub async fn update_profile(
    pool: &DbPool,
    id: &str,
    patch: ProfilePatch,
) -> Result<Option<User>, sqlx::Error> {
    let Some(existing) = get_by_id(pool, id).await? else {
        return Ok(None);
    };
    let display_name = patch.display_name.or(existing.display_name);
    let username = patch.username.or(existing.username);
    let bio = patch.bio.or(existing.bio);
    let avatar_url = patch.avatar_url.or(existing.avatar_url);
    let now = now_ms();

    sqlx::query(
        "UPDATE users SET display_name = ?, username = ?, bio = ?, avatar_url = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&display_name)
    .bind(&username)
    .bind(&bio)
    .bind(&avatar_url)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    get_by_id(pool, id).await
}

/// Sets a new password hash, e.g. after a reset-password redemption.
pub async fn set_password_hash(pool: &DbPool, id: &str, password_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(now_ms())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
