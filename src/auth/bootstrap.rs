use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use super::password::hash_password;
use crate::{
    config::BootstrapAdmin,
    db::models::{UserRole, UserStatus},
};

/// Seeds `admin` as an active admin account when the users table is empty.
/// Returns whether an account was created.
pub async fn ensure_admin(pool: &PgPool, admin: &BootstrapAdmin) -> Result<bool> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .context("counting users")?;
    if existing > 0 {
        return Ok(false);
    }

    let hash = hash_password(&admin.password).context("hashing bootstrap admin password")?;
    let email = admin.email.trim().to_lowercase();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role, status)
        VALUES ($1, $2, 'System', 'Administrator', $3, $4)
        RETURNING id
        "#,
    )
    .bind(&email)
    .bind(&hash)
    .bind(UserRole::Admin)
    .bind(UserStatus::Active)
    .fetch_one(pool)
    .await
    .context("inserting bootstrap admin")?;

    info!(user_id = id, email = %email, "Bootstrap admin created");
    Ok(true)
}
