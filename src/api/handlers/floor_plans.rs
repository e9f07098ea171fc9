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
        dto::{CreateFloorPlanRequest, FloorPlanDto},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        errors::AppError,
        extract::{AdminUser, CurrentUser},
    },
    db::models::FloorPlan,
};

#[utoipa::path(
    get,
    path = "/api/floor-plans",
    responses(
        (status = 200, description = "Floor plans by name", body = ApiResponse<Vec<FloorPlanDto>>),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "floor_plans"
)]
pub async fn list_floor_plans(
    _user: CurrentUser,
    State(pool): State<PgPool>,
) -> ApiResult<Vec<FloorPlanDto>> {
    let rows = sqlx::query_as::<_, FloorPlan>(
        "SELECT id, floor_plan_name, created_at FROM floor_plans ORDER BY floor_plan_name, id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(ApiResponse::data(rows.into_iter().map(Into::into).collect())))
}

#[utoipa::path(
    post,
    path = "/api/floor-plans",
    request_body = CreateFloorPlanRequest,
    responses(
        (status = 201, description = "Floor plan created", body = ApiResponse<FloorPlanDto>),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 409, description = "Name already taken", body = ErrorBody),
    ),
    tag = "floor_plans"
)]
pub async fn create_floor_plan(
    _admin: AdminUser,
    State(pool): State<PgPool>,
    payload: Result<Json<CreateFloorPlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<FloorPlanDto>>), AppError> {
    let req = payload?.0.normalized();
    req.validate()?;

    let plan = sqlx::query_as::<_, FloorPlan>(
        r#"
        INSERT INTO floor_plans (floor_plan_name)
        VALUES ($1)
        ON CONFLICT (floor_plan_name) DO NOTHING
        RETURNING id, floor_plan_name, created_at
        "#,
    )
    .bind(&req.floor_plan_name)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::Conflict("Floor plan already exists".into()))?;

    info!(floor_plan_id = plan.id, name = %plan.floor_plan_name, "Floor plan created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(plan.into()).with_message("Floor plan created successfully")),
    ))
}

/// Delete a floor plan. Its sensors are kept and detached.
#[utoipa::path(
    delete,
    path = "/api/floor-plans/{id}",
    params(("id" = i64, Path, description = "Floor plan id")),
    responses(
        (status = 200, description = "Floor plan deleted"),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Floor plan not found", body = ErrorBody),
    ),
    tag = "floor_plans"
)]
pub async fn delete_floor_plan(
    _admin: AdminUser,
    State(pool): State<PgPool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    let result = sqlx::query("DELETE FROM floor_plans WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Floor plan not found"));
    }
    info!(floor_plan_id = id, "Floor plan deleted");
    Ok(Json(ApiResponse::message("Floor plan deleted successfully")))
}
