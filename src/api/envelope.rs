//! The `{status, data|message}` JSON envelope shared by every `/api` response.

use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// Success envelope. Carries `data`, a human-readable `message`, or both.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Error envelope produced by [`AppError`].
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub status: Status,
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn data_envelope_omits_message() {
        let body = serde_json::to_value(ApiResponse::data(json!({ "id": 1 }))).unwrap();
        assert_eq!(body, json!({ "status": "success", "data": { "id": 1 } }));
    }

    #[test]
    fn message_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::message("Sensor deleted successfully")).unwrap();
        assert_eq!(
            body,
            json!({ "status": "success", "message": "Sensor deleted successfully" })
        );
    }

    #[test]
    fn data_with_message_carries_both() {
        let body = serde_json::to_value(ApiResponse::data(3).with_message("ok")).unwrap();
        assert_eq!(body, json!({ "status": "success", "message": "ok", "data": 3 }));
    }

    #[test]
    fn error_body_shape() {
        let body = serde_json::to_value(ErrorBody::new("Unauthorized access")).unwrap();
        assert_eq!(body, json!({ "status": "error", "message": "Unauthorized access" }));
    }
}
