//! Session-backed request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{errors::AppError, AppState};
use crate::db::models::User;

/// The user behind the request's session token.
///
/// Rejects with 401 when the token is missing, unknown, expired, or belongs
/// to an inactive account.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// The raw token the request authenticated with.
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin access required"))
        }
    }

    /// 403 unless the caller is an admin or is `user_id` themself.
    pub fn require_self_or_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.is_admin() || self.id() == user_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied"))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = state
            .sessions
            .token_from_headers(&parts.headers)
            .ok_or_else(unauthorized)?
            .to_owned();

        let user = state
            .sessions
            .authenticate(&token)
            .await?
            .ok_or_else(unauthorized)?;

        Ok(Self { user, token })
    }
}

/// A [`CurrentUser`] that is also an admin (403 otherwise).
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        current.require_admin()?;
        Ok(Self(current))
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized access".into())
}
