use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    db::models::{
        Alert, AlertStatistics, AlertStatus, AlertType, FloorPlan, ReadingStatus, Sensor,
        SensorReading, SensorStatus, User, UserRole, UserStatus,
    },
    monitoring::{MonitoringSnapshot, MonitoringStatistics, ReadingOutcome},
    navigation::MenuItem,
};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Request body for `POST /api/login`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// The identity summary the clients keep after logging in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUserDto {
    pub id: i64,
    pub email: String,
    /// `"first last"`.
    pub name: String,
    pub role: UserRole,
}

impl From<&User> for SessionUserDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            name: u.full_name(),
            role: u.role,
        }
    }
}

/// Response for `POST /api/login`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub status: crate::api::envelope::Status,
    pub message: String,
    pub user: SessionUserDto,
    /// Opaque session token, also set as an HttpOnly cookie.
    /// Non-browser clients send it back as `Authorization: Bearer <token>`.
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Users & profile
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            status: u.status,
            created_at: u.created_at,
        }
    }
}

/// Request body for `POST /api/users`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl CreateUserRequest {
    /// Lower-cases the email and trims names so blank input fails validation.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_lowercase();
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        self
    }
}

/// Request body for `PUT /api/users/{id}`. `role` and `status` are honoured
/// for admins only.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UpdateUserRequest {
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        self
    }
}

/// Request body for `PUT /api/profile`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
}

impl UpdateProfileRequest {
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        self
    }
}

/// Request body for `POST /api/profile/password`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorDto {
    pub id: i64,
    pub sensor_name: String,
    pub sensor_type: String,
    pub location: String,
    pub floor_plan_id: Option<i64>,
    pub floor_plan_name: Option<String>,
    pub status: SensorStatus,
    pub last_reading: Option<f64>,
    pub threshold_value: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Sensor> for SensorDto {
    fn from(s: Sensor) -> Self {
        Self {
            id: s.id,
            sensor_name: s.sensor_name,
            sensor_type: s.sensor_type,
            location: s.location,
            floor_plan_id: s.floor_plan_id,
            floor_plan_name: s.floor_plan_name,
            status: s.status,
            last_reading: s.last_reading,
            threshold_value: s.threshold_value,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Request body for `POST /api/sensors` and `PUT /api/sensors/{id}`.
///
/// On create a missing `status` means `active`; on update it keeps the
/// current status.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SensorRequest {
    #[validate(length(min = 1, message = "Sensor name is required"))]
    pub sensor_name: String,
    #[validate(length(min = 1, message = "Sensor type is required"))]
    pub sensor_type: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    pub threshold_value: f64,
    pub floor_plan_id: Option<i64>,
    pub status: Option<SensorStatus>,
}

impl SensorRequest {
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.sensor_name);
        trim_in_place(&mut self.sensor_type);
        trim_in_place(&mut self.location);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorReadingDto {
    pub id: i64,
    pub sensor_id: i64,
    pub reading_value: f64,
    pub status: ReadingStatus,
    pub recorded_at: DateTime<Utc>,
}

impl From<SensorReading> for SensorReadingDto {
    fn from(r: SensorReading) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            reading_value: r.reading_value,
            status: r.status,
            recorded_at: r.recorded_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReadingHistoryParams {
    /// Start of time range (RFC3339, inclusive).
    pub from: Option<DateTime<Utc>>,
    /// End of time range (RFC3339, inclusive).
    pub to: Option<DateTime<Utc>>,
    /// Maximum rows, newest first. Defaults to 100, capped at 1000.
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlertDto {
    pub id: i64,
    pub sensor_id: i64,
    pub alert_type: AlertType,
    pub message: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sensor_name: String,
    pub location: String,
    pub sensor_type: String,
    pub threshold_value: f64,
    pub last_reading: Option<f64>,
}

impl From<Alert> for AlertDto {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id,
            sensor_id: a.sensor_id,
            alert_type: a.alert_type,
            message: a.message,
            status: a.status,
            created_at: a.created_at,
            resolved_at: a.resolved_at,
            sensor_name: a.sensor_name,
            location: a.location,
            sensor_type: a.sensor_type,
            threshold_value: a.threshold_value,
            last_reading: a.last_reading,
        }
    }
}

/// `status` query filter for `GET /api/alerts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatusFilter {
    #[default]
    All,
    Active,
    Acknowledged,
    Resolved,
}

impl AlertStatusFilter {
    pub fn as_status(self) -> Option<AlertStatus> {
        match self {
            AlertStatusFilter::All => None,
            AlertStatusFilter::Active => Some(AlertStatus::Active),
            AlertStatusFilter::Acknowledged => Some(AlertStatus::Acknowledged),
            AlertStatusFilter::Resolved => Some(AlertStatus::Resolved),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertListParams {
    /// `all` (default), `active`, `acknowledged` or `resolved`.
    pub status: Option<AlertStatusFilter>,
    /// Maximum alerts returned. Defaults to 50, clamped to 1..=500.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AlertListDto {
    pub alerts: Vec<AlertDto>,
    /// Counters over every alert, independent of the `status` filter.
    pub statistics: AlertStatistics,
}

/// Request body for `POST /api/alerts`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAlertRequest {
    pub sensor_id: i64,
    pub alert_type: AlertType,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    pub status: Option<AlertStatus>,
}

/// Request body for `PUT /api/alerts/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAlertRequest {
    pub status: AlertStatus,
}

// ---------------------------------------------------------------------------
// Monitoring
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonitoringParams {
    /// Restrict the snapshot to the active sensors of one floor plan.
    pub floor_plan_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonitoringSnapshotDto {
    pub statistics: MonitoringStatistics,
    pub sensors: Vec<SensorDto>,
    pub floor_plans: Vec<FloorPlanDto>,
    /// The most recent active alerts, at most ten. `statistics.active_alerts`
    /// counts all of them, not only the ones listed here.
    pub alerts: Vec<AlertDto>,
}

impl From<MonitoringSnapshot> for MonitoringSnapshotDto {
    fn from(s: MonitoringSnapshot) -> Self {
        Self {
            statistics: s.statistics,
            sensors: s.sensors.into_iter().map(Into::into).collect(),
            floor_plans: s.floor_plans.into_iter().map(Into::into).collect(),
            alerts: s.alerts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request body for `POST /api/monitoring/readings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordReadingRequest {
    pub sensor_id: i64,
    pub reading_value: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadingOutcomeDto {
    pub reading: SensorReadingDto,
    /// The alert raised by this reading, if it breached the threshold.
    pub alert: Option<AlertDto>,
}

impl From<ReadingOutcome> for ReadingOutcomeDto {
    fn from(o: ReadingOutcome) -> Self {
        Self {
            reading: o.reading.into(),
            alert: o.alert.map(Into::into),
        }
    }
}

// ---------------------------------------------------------------------------
// Floor plans
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FloorPlanDto {
    pub id: i64,
    pub floor_plan_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<FloorPlan> for FloorPlanDto {
    fn from(f: FloorPlan) -> Self {
        Self {
            id: f.id,
            floor_plan_name: f.floor_plan_name,
            created_at: f.created_at,
        }
    }
}

/// Request body for `POST /api/floor-plans`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFloorPlanRequest {
    #[validate(length(min = 1, message = "Floor plan name is required"))]
    pub floor_plan_name: String,
}

impl CreateFloorPlanRequest {
    pub fn normalized(mut self) -> Self {
        trim_in_place(&mut self.floor_plan_name);
        self
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NavigationDto {
    pub user: SessionUserDto,
    pub menu: Vec<MenuItem>,
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn alert_filter_defaults_to_all() {
        let params: AlertListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.status.unwrap_or_default(), AlertStatusFilter::All);
        assert_eq!(AlertStatusFilter::All.as_status(), None);
        assert_eq!(
            AlertStatusFilter::Resolved.as_status(),
            Some(AlertStatus::Resolved)
        );
    }

    #[test]
    fn alert_filter_rejects_unknown_status() {
        let parsed = serde_json::from_value::<AlertStatusFilter>(json!("closed"));
        assert!(parsed.is_err());
    }

    #[test]
    fn login_request_tolerates_missing_fields() {
        let req: LoginRequest = serde_json::from_value(json!({ "email": "a@b.co" })).unwrap();
        assert!(req.password.is_empty());
    }

    #[test]
    fn create_user_validation_collects_field_errors() {
        let req = CreateUserRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            first_name: "Ana".into(),
            last_name: "Reyes".into(),
            role: None,
            status: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn sensor_request_requires_threshold() {
        let parsed = serde_json::from_value::<SensorRequest>(json!({
            "sensor_name": "Kitchen LPG",
            "sensor_type": "gas",
            "location": "Kitchen",
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn session_user_name_is_full_name() {
        let user = User {
            id: 3,
            email: "maria@bantaygas.local".into(),
            password_hash: String::new(),
            first_name: "Maria".into(),
            last_name: "Santos".into(),
            role: UserRole::Admin,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let dto = SessionUserDto::from(&user);
        assert_eq!(dto.name, "Maria Santos");
        assert_eq!(dto.role, UserRole::Admin);
    }

    #[test]
    fn blank_names_fail_validation_after_normalizing() {
        let req: SensorRequest = serde_json::from_value(json!({
            "sensor_name": "   ",
            "sensor_type": " gas ",
            "location": "Kitchen",
            "threshold_value": 10.0,
        }))
        .unwrap();
        let req = req.normalized();
        assert_eq!(req.sensor_type, "gas");
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("sensor_name"));

        let profile = UpdateProfileRequest {
            first_name: "\t".into(),
            last_name: " Silang ".into(),
        }
        .normalized();
        assert_eq!(profile.last_name, "Silang");
        assert!(profile.validate().is_err());
    }
}
