use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::envelope::ErrorBody;
use crate::{auth::password::PasswordError, monitoring::MonitoringError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "Request failed");
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody::new(message))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::RowNotFound => return AppError::not_found("Resource not found"),
            sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
            _ => None,
        };
        match code.as_deref() {
            Some("23505") => AppError::Conflict("Resource already exists".into()),
            Some("23503") => AppError::not_found("Referenced resource not found"),
            _ => AppError::Internal(err.into()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<MonitoringError> for AppError {
    fn from(err: MonitoringError) -> Self {
        match err {
            MonitoringError::SensorNotFound(_) => AppError::not_found(err.to_string()),
            MonitoringError::InvalidReading => AppError::bad_request(err.to_string()),
            MonitoringError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("Invalid {field}"),
                })
            })
            .collect();
        messages.sort();
        AppError::BadRequest(messages.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::BadRequest(data_error_message(&e.body_text())),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Absent fields are reported together; a present but unusable field by its
/// JSON path, e.g. `"Invalid status"` for an unknown enum value.
fn data_error_message(text: &str) -> String {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, rest)| rest);
    if detail.contains("missing field") {
        return "Required fields missing".to_owned();
    }
    match detail.split_once(": ") {
        Some((path, _)) if !path.is_empty() && !path.contains(' ') => format!("Invalid {path}"),
        _ => "Invalid request body".to_owned(),
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::FromRequest, http::{header, Request}};
    use serde::Deserialize;
    use validator::Validate;

    use super::*;
    use crate::db::models::AlertStatus;

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn pool_errors_are_internal() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_message_is_not_leaked() {
        let resp = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[test]
    fn validation_errors_use_field_message() {
        let errors = Probe { email: "nope".into() }.validate().unwrap_err();
        let err: AppError = errors.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[allow(dead_code)]
    #[derive(Debug, Deserialize)]
    struct StatusBody {
        status: AlertStatus,
        note: String,
    }

    async fn rejected(body: &'static str) -> AppError {
        let req = Request::builder()
            .method("PUT")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        Json::<StatusBody>::from_request(req, &())
            .await
            .unwrap_err()
            .into()
    }

    #[tokio::test]
    async fn missing_field_reports_required_fields() {
        let err = rejected(r#"{"note":"x"}"#).await;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Required fields missing");
    }

    #[tokio::test]
    async fn bad_value_names_the_field() {
        let err = rejected(r#"{"status":"closed","note":"x"}"#).await;
        assert_eq!(err.to_string(), "Invalid status");

        let err = rejected(r#"{"status":"active","note":5}"#).await;
        assert_eq!(err.to_string(), "Invalid note");
    }

    #[test]
    fn data_error_without_path_is_generic() {
        assert_eq!(
            data_error_message(
                "Failed to deserialize the JSON body into the target type: \
                 invalid type: integer `3`, expected struct StatusBody at line 1 column 1"
            ),
            "Invalid request body"
        );
    }
}
