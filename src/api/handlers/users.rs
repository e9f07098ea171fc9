use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::{
    api::{
        dto::{CreateUserRequest, UpdateUserRequest, UserDto},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        errors::AppError,
        extract::{AdminUser, CurrentUser},
    },
    auth::password::hash_password,
    db::{
        models::{User, UserRole, UserStatus},
        sql::USER_COLUMNS,
    },
};

pub(crate) async fn fetch_user(pool: &PgPool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// List every account, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserDto>>),
        (status = 403, description = "Admin access required", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn list_users(
    _admin: AdminUser,
    State(pool): State<PgPool>,
) -> ApiResult<Vec<UserDto>> {
    let rows = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::data(rows.into_iter().map(Into::into).collect())))
}

/// Fetch one account. Admins may read anyone; users only themselves.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = ApiResponse<UserDto>),
        (status = 403, description = "Access denied", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn get_user(
    current: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<UserDto> {
    let Path(id) = id?;
    current.require_self_or_admin(id)?;
    let user = fetch_user(&pool, id).await?;
    Ok(Json(ApiResponse::data(user.into())))
}

/// Create a staff account. `role` defaults to `user`, `status` to `active`.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 409, description = "Email already exists", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(pool): State<PgPool>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), AppError> {
    let req = payload?.0.normalized();
    req.validate()?;

    let password_hash = hash_password(&req.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO NOTHING
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(req.role.unwrap_or(UserRole::User))
    .bind(req.status.unwrap_or(UserStatus::Active))
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Email already exists".into()))?;

    info!(user_id = user.id, created_by = admin.id(), role = %user.role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(user.into()).with_message("User created successfully")),
    ))
}

/// Update names, and for admins also `role` and `status`.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 403, description = "Access denied", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn update_user(
    current: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<UserDto> {
    let Path(id) = id?;
    current.require_self_or_admin(id)?;
    let req = payload?.0.normalized();
    req.validate()?;

    let (role, status) = if current.is_admin() {
        (req.role, req.status)
    } else {
        (None, None)
    };

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET first_name = $2,
            last_name = $3,
            role = COALESCE($4, role),
            status = COALESCE($5, status),
            updated_at = now()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&req.first_name)
    .bind(&req.last_name)
    .bind(role)
    .bind(status)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    info!(user_id = id, updated_by = current.id(), "User updated");
    Ok(Json(
        ApiResponse::data(user.into()).with_message("User updated successfully"),
    ))
}

/// Delete an account. Admins cannot delete themselves.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete your own account", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "users"
)]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    if id == admin.id() {
        return Err(AppError::bad_request("Cannot delete your own account"));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("User not found"));
    }

    info!(user_id = id, deleted_by = admin.id(), "User deleted");
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
