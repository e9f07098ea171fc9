pub mod alerts;
pub mod auth;
pub mod floor_plans;
pub mod monitoring;
pub mod navigation;
pub mod profile;
pub mod sensors;
pub mod users;

use utoipa::OpenApi;

use super::{
    dto::{
        AlertDto, AlertListDto, AlertStatusFilter, ChangePasswordRequest, CreateAlertRequest,
        CreateFloorPlanRequest, CreateUserRequest, FloorPlanDto, LoginRequest, LoginResponse,
        MonitoringSnapshotDto, NavigationDto, ReadingOutcomeDto, RecordReadingRequest,
        SensorDto, SensorReadingDto, SensorRequest, SessionUserDto, UpdateAlertRequest,
        UpdateProfileRequest, UpdateUserRequest, UserDto,
    },
    envelope::{ErrorBody, Status},
};
use crate::{
    db::models::{
        AlertStatistics, AlertStatus, AlertType, ReadingStatus, SensorStatus, UserRole,
        UserStatus,
    },
    monitoring::MonitoringStatistics,
    navigation::MenuItem,
};

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI document
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::login,
        auth::logout,
        profile::get_profile,
        profile::update_profile,
        profile::change_password,
        navigation::get_navigation,
        sensors::list_sensors,
        sensors::get_sensor,
        sensors::create_sensor,
        sensors::update_sensor,
        sensors::delete_sensor,
        sensors::get_sensor_readings,
        alerts::list_alerts,
        alerts::create_alert,
        alerts::update_alert,
        monitoring::get_snapshot,
        monitoring::record_reading,
        floor_plans::list_floor_plans,
        floor_plans::create_floor_plan,
        floor_plans::delete_floor_plan,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(schemas(
        Status, ErrorBody,
        LoginRequest, LoginResponse, SessionUserDto,
        UserDto, CreateUserRequest, UpdateUserRequest, UpdateProfileRequest, ChangePasswordRequest,
        SensorDto, SensorRequest, SensorReadingDto,
        AlertDto, AlertListDto, AlertStatusFilter, AlertStatistics, CreateAlertRequest, UpdateAlertRequest,
        MonitoringSnapshotDto, MonitoringStatistics, RecordReadingRequest, ReadingOutcomeDto,
        FloorPlanDto, CreateFloorPlanRequest,
        NavigationDto, MenuItem,
        UserRole, UserStatus, SensorStatus, AlertType, AlertStatus, ReadingStatus,
    )),
    tags(
        (name = "auth",        description = "Login and session endpoints"),
        (name = "profile",     description = "The signed-in user's own account"),
        (name = "sensors",     description = "Sensor management"),
        (name = "alerts",      description = "Alert listing and triage"),
        (name = "monitoring",  description = "Dashboard snapshot and reading ingestion"),
        (name = "floor_plans", description = "Floor plan management"),
        (name = "users",       description = "Staff management (admin)"),
        (name = "system",      description = "System endpoints"),
    ),
    info(
        title = "BantayGas API",
        version = "0.1.0",
        description = "REST API for BantayGas gas-leak monitoring"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Test helpers shared by the handler test modules
// ---------------------------------------------------------------------------
