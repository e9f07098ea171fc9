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
        dto::{ReadingHistoryParams, SensorDto, SensorReadingDto, SensorRequest},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        errors::AppError,
        extract::CurrentUser,
    },
    db::{
        models::{Sensor, SensorReading, SensorStatus},
        sql::SENSOR_SELECT,
    },
};

const DEFAULT_HISTORY_LIMIT: i64 = 100;
const MAX_HISTORY_LIMIT: i64 = 1000;

async fn fetch_sensor(pool: &PgPool, id: i64) -> Result<Sensor, AppError> {
    sqlx::query_as::<_, Sensor>(&format!("{SENSOR_SELECT} WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Sensor not found"))
}

async fn ensure_floor_plan(pool: &PgPool, floor_plan_id: Option<i64>) -> Result<(), AppError> {
    let Some(id) = floor_plan_id else {
        return Ok(());
    };
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM floor_plans WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::not_found("Floor plan not found"))
    }
}

/// List every sensor, newest first.
#[utoipa::path(
    get,
    path = "/api/sensors",
    responses(
        (status = 200, description = "All sensors", body = ApiResponse<Vec<SensorDto>>),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    _user: CurrentUser,
    State(pool): State<PgPool>,
) -> ApiResult<Vec<SensorDto>> {
    let rows = sqlx::query_as::<_, Sensor>(&format!(
        "{SENSOR_SELECT} ORDER BY s.created_at DESC, s.id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::data(rows.into_iter().map(Into::into).collect())))
}

/// Fetch one sensor by id.
#[utoipa::path(
    get,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "The sensor", body = ApiResponse<SensorDto>),
        (status = 404, description = "Sensor not found", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<SensorDto> {
    let Path(id) = id?;
    let sensor = fetch_sensor(&pool, id).await?;
    Ok(Json(ApiResponse::data(sensor.into())))
}

/// Register a sensor. `status` defaults to `active`.
#[utoipa::path(
    post,
    path = "/api/sensors",
    request_body = SensorRequest,
    responses(
        (status = 201, description = "Sensor created", body = ApiResponse<SensorDto>),
        (status = 400, description = "Required fields missing", body = ErrorBody),
        (status = 404, description = "Floor plan not found", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn create_sensor(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    payload: Result<Json<SensorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SensorDto>>), AppError> {
    let req = payload?.0.normalized();
    req.validate()?;
    ensure_floor_plan(&pool, req.floor_plan_id).await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sensors (sensor_name, sensor_type, location, floor_plan_id, status, threshold_value)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&req.sensor_name)
    .bind(&req.sensor_type)
    .bind(&req.location)
    .bind(req.floor_plan_id)
    .bind(req.status.unwrap_or(SensorStatus::Active))
    .bind(req.threshold_value)
    .fetch_one(&pool)
    .await?;

    info!(sensor_id = id, name = %req.sensor_name, "Sensor created");

    let sensor = fetch_sensor(&pool, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(sensor.into()).with_message("Sensor created successfully")),
    ))
}

/// Replace a sensor's editable fields. A missing `status` keeps the current one.
#[utoipa::path(
    put,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    request_body = SensorRequest,
    responses(
        (status = 200, description = "Sensor updated", body = ApiResponse<SensorDto>),
        (status = 400, description = "Required fields missing", body = ErrorBody),
        (status = 404, description = "Sensor or floor plan not found", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn update_sensor(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SensorRequest>, JsonRejection>,
) -> ApiResult<SensorDto> {
    let Path(id) = id?;
    let req = payload?.0.normalized();
    req.validate()?;
    ensure_floor_plan(&pool, req.floor_plan_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE sensors
        SET sensor_name = $2,
            sensor_type = $3,
            location = $4,
            floor_plan_id = $5,
            status = COALESCE($6, status),
            threshold_value = $7,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&req.sensor_name)
    .bind(&req.sensor_type)
    .bind(&req.location)
    .bind(req.floor_plan_id)
    .bind(req.status)
    .bind(req.threshold_value)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Sensor not found"));
    }
    info!(sensor_id = id, "Sensor updated");

    let sensor = fetch_sensor(&pool, id).await?;
    Ok(Json(
        ApiResponse::data(sensor.into()).with_message("Sensor updated successfully"),
    ))
}

/// Delete a sensor together with its readings and alerts.
#[utoipa::path(
    delete,
    path = "/api/sensors/{id}",
    params(("id" = i64, Path, description = "Sensor id")),
    responses(
        (status = 200, description = "Sensor deleted"),
        (status = 404, description = "Sensor not found", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn delete_sensor(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let result = sqlx::query("DELETE FROM sensors WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Sensor not found"));
    }
    info!(sensor_id = id, "Sensor deleted");
    Ok(Json(ApiResponse::message("Sensor deleted successfully")))
}

/// Reading history of one sensor, newest first. Optionally bounded with
/// `?from=<RFC3339>&to=<RFC3339>`.
#[utoipa::path(
    get,
    path = "/api/sensors/{id}/readings",
    params(("id" = i64, Path, description = "Sensor id"), ReadingHistoryParams),
    responses(
        (status = 200, description = "Sensor readings", body = ApiResponse<Vec<SensorReadingDto>>),
        (status = 404, description = "Sensor not found", body = ErrorBody),
    ),
    tag = "sensors"
)]
pub async fn get_sensor_readings(
    _user: CurrentUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<ReadingHistoryParams>, QueryRejection>,
) -> ApiResult<Vec<SensorReadingDto>> {
    let Path(id) = id?;
    let Query(params) = params?;
    fetch_sensor(&pool, id).await?;

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = sqlx::query_as::<_, SensorReading>(
        r#"
        SELECT id, sensor_id, reading_value, status, recorded_at
        FROM sensor_readings
        WHERE sensor_id = $1
          AND ($2::timestamptz IS NULL OR recorded_at >= $2)
          AND ($3::timestamptz IS NULL OR recorded_at <= $3)
        ORDER BY recorded_at DESC, id DESC
        LIMIT $4
        "#,
    )
    .bind(id)
    .bind(params.from)
    .bind(params.to)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::data(rows.into_iter().map(Into::into).collect())))
}
