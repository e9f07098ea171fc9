use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::{
    api::{
        dto::{AlertDto, AlertListDto, AlertListParams, CreateAlertRequest, UpdateAlertRequest},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        errors::AppError,
        extract::CurrentUser,
    },
    db::{
        models::{Alert, AlertStatistics, AlertStatus},
        sql::ALERT_SELECT,
    },
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

async fn fetch_alert(pool: &PgPool, id: i64) -> Result<Alert, AppError> {
    sqlx::query_as::<_, Alert>(&format!("{ALERT_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Alert not found"))
}

/// List alerts, newest first, with counters over the whole table.
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(AlertListParams),
    responses(
        (status = 200, description = "Alerts and statistics", body = ApiResponse<AlertListDto>),
        (status = 400, description = "Unknown status filter", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    params: Result<Query<AlertListParams>, QueryRejection>,
) -> ApiResult<AlertListDto> {
    let Query(params) = params?;
    let status = params.status.unwrap_or_default().as_status();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let alerts = sqlx::query_as::<_, Alert>(&format!(
        "{ALERT_SELECT} WHERE ($1::alert_status IS NULL OR a.status = $1) \
         ORDER BY a.created_at DESC, a.id DESC LIMIT $2"
    ))
    .bind(status)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    let statistics = sqlx::query_as::<_, AlertStatistics>(
        r#"
        SELECT COUNT(*)                                        AS total,
               COUNT(*) FILTER (WHERE status = 'active')       AS active,
               COUNT(*) FILTER (WHERE status = 'acknowledged') AS acknowledged,
               COUNT(*) FILTER (WHERE status = 'resolved')     AS resolved,
               COUNT(*) FILTER (WHERE alert_type = 'critical') AS critical,
               COUNT(*) FILTER (WHERE alert_type = 'warning')  AS warning
        FROM alerts
        "#,
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(ApiResponse::data(AlertListDto {
        alerts: alerts.into_iter().map(Into::into).collect(),
        statistics,
    })))
}

/// Open an alert by hand. `status` defaults to `active`.
#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 201, description = "Alert created", body = ApiResponse<AlertDto>),
        (status = 400, description = "Required fields missing", body = ErrorBody),
        (status = 404, description = "Sensor not found", body = ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn create_alert(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AlertDto>>), AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let sensor_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sensors WHERE id = $1)")
            .bind(req.sensor_id)
            .fetch_one(&pool)
            .await?;
    if !sensor_exists {
        return Err(AppError::not_found("Sensor not found"));
    }

    let status = req.status.unwrap_or(AlertStatus::Active);
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO alerts (sensor_id, alert_type, message, status, resolved_at)
        VALUES ($1, $2, $3, $4, CASE WHEN $4 = 'resolved'::alert_status THEN now() END)
        RETURNING id
        "#,
    )
    .bind(req.sensor_id)
    .bind(req.alert_type)
    .bind(&req.message)
    .bind(status)
    .fetch_one(&pool)
    .await?;

    info!(alert_id = id, sensor_id = req.sensor_id, %status, "Alert created");

    let alert = fetch_alert(&pool, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(alert.into()).with_message("Alert created successfully")),
    ))
}

/// Move an alert to a new status. `resolved` stamps `resolved_at`; any
/// other status clears it.
#[utoipa::path(
    put,
    path = "/api/alerts/{id}",
    params(("id" = i64, Path, description = "Alert id")),
    request_body = UpdateAlertRequest,
    responses(
        (status = 200, description = "Alert updated", body = ApiResponse<AlertDto>),
        (status = 400, description = "Missing or unknown status", body = ErrorBody),
        (status = 404, description = "Alert not found", body = ErrorBody),
    ),
    tag = "alerts"
)]
pub async fn update_alert(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateAlertRequest>, JsonRejection>,
) -> ApiResult<AlertDto> {
    let Path(id) = id?;
    let Json(req) = payload?;

    let result = sqlx::query(
        r#"
        UPDATE alerts
        SET status = $2,
            resolved_at = CASE WHEN $2 = 'resolved'::alert_status THEN now() END
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(req.status)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Alert not found"));
    }
    info!(alert_id = id, status = %req.status, "Alert status updated");

    let alert = fetch_alert(&pool, id).await?;
    Ok(Json(
        ApiResponse::data(alert.into()).with_message("Alert updated successfully"),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::handlers::test_support::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn list_filters_but_statistics_cover_everything(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen", 500.0, None).await;
        insert_alert(&pool, sensor, "critical", "active").await;
        insert_alert(&pool, sensor, "critical", "active").await;
        insert_alert(&pool, sensor, "warning", "acknowledged").await;
        insert_alert(&pool, sensor, "warning", "resolved").await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .get("/api/alerts?status=active")
            .authorization_bearer(&token)
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let alerts = body["data"]["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a["status"] == "active"));
        assert_eq!(alerts[0]["sensor_name"], "Kitchen");
        assert_eq!(
            body["data"]["statistics"],
            json!({
                "total": 4,
                "active": 2,
                "acknowledged": 1,
                "resolved": 1,
                "critical": 2,
                "warning": 2,
            })
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn list_respects_limit_and_rejects_unknown_filter(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen", 500.0, None).await;
        for _ in 0..3 {
            insert_alert(&pool, sensor, "warning", "active").await;
        }
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .get("/api/alerts?limit=2")
            .authorization_bearer(&token)
            .await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>()["data"]["alerts"].as_array().unwrap().len(), 2);

        server
            .get("/api/alerts?status=closed")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_alert_defaults_to_active(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Garage", 300.0, None).await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .post("/api/alerts")
            .authorization_bearer(&token)
            .json(&json!({
                "sensor_id": sensor,
                "alert_type": "warning",
                "message": "Smell of gas reported",
            }))
            .await;
        resp.assert_status(StatusCode::CREATED);
        let body: Value = resp.json();
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(body["data"]["alert_type"], "warning");
        assert_eq!(body["data"]["location"], "Kitchen");
        assert!(body["data"]["resolved_at"].is_null());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn create_alert_for_unknown_sensor_is_404(pool: PgPool) {
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        server
            .post("/api/alerts")
            .authorization_bearer(&token)
            .json(&json!({ "sensor_id": 77, "alert_type": "critical", "message": "x" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn resolving_stamps_resolved_at_and_reopening_clears_it(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen", 500.0, None).await;
        let alert = insert_alert(&pool, sensor, "critical", "active").await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .put(&format!("/api/alerts/{alert}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "resolved" }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["data"]["status"], "resolved");
        assert!(body["data"]["resolved_at"].is_string());

        let resp = server
            .put(&format!("/api/alerts/{alert}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "acknowledged" }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["data"]["status"], "acknowledged");
        assert!(body["data"]["resolved_at"].is_null());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unknown_status_value_is_named_in_the_error(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen", 500.0, None).await;
        let alert = insert_alert(&pool, sensor, "critical", "active").await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .put(&format!("/api/alerts/{alert}"))
            .authorization_bearer(&token)
            .json(&json!({ "status": "closed" }))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<Value>()["message"], "Invalid status");

        let resp = server
            .put(&format!("/api/alerts/{alert}"))
            .authorization_bearer(&token)
            .json(&json!({}))
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(resp.json::<Value>()["message"], "Required fields missing");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn updating_unknown_alert_is_404(pool: PgPool) {
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server
            .put("/api/alerts/12345")
            .authorization_bearer(&token)
            .json(&json!({ "status": "resolved" }))
            .await;
        resp.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(resp.json::<Value>()["message"], "Alert not found");
    }
}
