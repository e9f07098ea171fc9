use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;
use validator::Validate;

use crate::{
    api::{
        dto::{ChangePasswordRequest, UpdateProfileRequest, UserDto},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        extract::CurrentUser,
        AppState,
    },
    auth::password::hash_password,
    db::{models::User, sql::USER_COLUMNS},
};

/// The signed-in user's own account.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Own account", body = ApiResponse<UserDto>),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "profile"
)]
pub async fn get_profile(current: CurrentUser) -> ApiResult<UserDto> {
    Ok(Json(ApiResponse::data(current.user.into())))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Required fields missing", body = ErrorBody),
    ),
    tag = "profile"
)]
pub async fn update_profile(
    current: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<UserDto> {
    let req = payload?.0.normalized();
    req.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET first_name = $2, last_name = $3, updated_at = now()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(current.id())
    .bind(&req.first_name)
    .bind(&req.last_name)
    .fetch_one(&state.pool)
    .await?;

    info!(user_id = user.id, "Profile updated");
    Ok(Json(
        ApiResponse::data(user.into()).with_message("Profile updated successfully"),
    ))
}

/// Set a new password. Every other session of the account is signed out;
/// the calling session stays valid.
#[utoipa::path(
    post,
    path = "/api/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Password too short", body = ErrorBody),
    ),
    tag = "profile"
)]
pub async fn change_password(
    current: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = payload?;
    req.validate()?;

    let hash = hash_password(&req.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(current.id())
        .bind(&hash)
        .execute(&state.pool)
        .await?;

    let revoked = state
        .sessions
        .revoke_others(current.id(), &current.token)
        .await?;

    info!(user_id = current.id(), revoked, "Password changed");
    Ok(Json(ApiResponse::message("Password changed successfully")))
}
