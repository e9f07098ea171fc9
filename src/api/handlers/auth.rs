use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    api::{
        dto::{LoginRequest, LoginResponse, SessionUserDto},
        envelope::{ApiResponse, ErrorBody, Status},
        errors::AppError,
        AppState,
    },
    auth::password::verify_password,
    db::{
        models::{User, UserStatus},
        sql::USER_COLUMNS,
    },
};

/// Log in with email and password. Sets the session cookie and also returns
/// the token for clients that prefer a bearer header.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing or malformed credentials", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(mut req) = payload?;
    req.email = req.email.trim().to_owned();

    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }
    req.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) AND status = $2"
    ))
    .bind(&req.email)
    .bind(UserStatus::Active)
    .fetch_optional(&state.pool)
    .await?;

    let verified = match &user {
        Some(u) => match verify_password(&req.password, &u.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(user_id = u.id, error = %e, "Stored password hash is unusable");
                false
            }
        },
        None => false,
    };
    let user = match user {
        Some(u) if verified => u,
        _ => {
            warn!(email = %req.email, "Failed login attempt");
            return Err(AppError::Unauthorized("Invalid email or password".into()));
        }
    };

    let session = state.sessions.create(user.id).await?;
    info!(user_id = user.id, role = %user.role, "User logged in");

    let mut headers = HeaderMap::new();
    if let Ok(cookie) = HeaderValue::from_str(&state.sessions.session_cookie(&session.token)) {
        headers.insert(SET_COOKIE, cookie);
    }

    let body = LoginResponse {
        status: Status::Success,
        message: "Login successful".into(),
        user: SessionUserDto::from(&user),
        token: session.token,
        expires_at: session.expires_at,
    };
    Ok((headers, Json(body)).into_response())
}

/// End the current session, if any, and clear the session cookie.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out"),
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    if let Some(token) = state.sessions.token_from_headers(&headers) {
        if state.sessions.revoke(token).await? {
            info!("Session revoked");
        }
    }

    let mut out = HeaderMap::new();
    if let Ok(cookie) = HeaderValue::from_str(&state.sessions.clear_cookie()) {
        out.insert(SET_COOKIE, cookie);
    }
    Ok((out, Json(ApiResponse::message("Logged out successfully"))).into_response())
}
