//! Server-side login sessions.
//!
//! A session is addressed by an opaque token handed to the client, either as
//! an HttpOnly cookie (dashboard) or as a bearer token (mobile client). Only
//! the SHA-256 of the token is persisted.

use std::time::Duration;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    config::SessionConfig,
    db::{
        models::{User, UserStatus},
        sql::USER_COLUMNS,
    },
};

/// A freshly issued session. `token` is only ever shown to the client once.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    pool: PgPool,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(pool: PgPool, config: SessionConfig) -> Self {
        Self { pool, config }
    }

    /// Start a session for `user_id`.
    pub async fn create(&self, user_id: i64) -> Result<IssuedSession, sqlx::Error> {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + chrono::Duration::seconds(self.config.ttl_secs);

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id, %expires_at, "Session created");
        Ok(IssuedSession { token, expires_at })
    }

    /// Resolve `token` to its user. Expired sessions and inactive users yield `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM users \
             WHERE id = (SELECT user_id FROM sessions WHERE token_hash = $1 AND expires_at > now()) \
               AND status = $2",
            cols = USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&query)
            .bind(hash_token(token))
            .bind(UserStatus::Active)
            .fetch_optional(&self.pool)
            .await
    }

    /// Delete the session behind `token`. Returns whether one existed.
    pub async fn revoke(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session of `user_id` except the one behind `keep_token`.
    pub async fn revoke_others(&self, user_id: i64, keep_token: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token_hash <> $2")
            .bind(user_id)
            .bind(hash_token(keep_token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Runs the expired-session purge indefinitely.
    /// Spawn this via `tokio::spawn`.
    pub async fn run_purge_loop(self) {
        let interval = Duration::from_secs(self.config.purge_interval_secs.max(1));
        info!(interval_secs = interval.as_secs(), "Session purge loop started");
        let mut ticker = time::interval(interval);

        loop {
            ticker.tick().await;
            match self.purge_expired().await {
                Ok(0) => {}
                Ok(n) => info!(purged = n, "Expired sessions purged"),
                Err(e) => error!(error = %e, "Failed to purge expired sessions"),
            }
        }
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        self.build_cookie(token, self.config.ttl_secs)
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        self.build_cookie("", 0)
    }

    fn build_cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.config.cookie_name, value, max_age
        );
        if self.config.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Pull the session token from `Authorization: Bearer` or the session cookie,
    /// in that order.
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        bearer_token(headers).or_else(|| cookie_value(headers, &self.config.cookie_name))
    }
}

/// SHA-256 hex digest of a session token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}
