use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Enums (mirror the Postgres enum types in migrations/)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sensor_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Active,
    Inactive,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        })
    }
}

/// Classification stored with every appended reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "reading_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Normal,
    Critical,
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2id PHC string. Never serialised.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A sensor joined with the name of its floor plan, if any.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sensor {
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

/// An alert joined with the fields of the sensor that raised it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Alert {
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

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FloorPlan {
    pub id: i64,
    pub floor_plan_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: i64,
    pub reading_value: f64,
    pub status: ReadingStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregate counters over the whole alerts table.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize, ToSchema)]
pub struct AlertStatistics {
    pub total: i64,
    pub active: i64,
    pub acknowledged: i64,
    pub resolved: i64,
    pub critical: i64,
    pub warning: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            email: "juan@bantaygas.local".into(),
            password_hash: "$argon2id$...".into(),
            first_name: "Juan".into(),
            last_name: "Dela Cruz".into(),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(user(UserRole::User).full_name(), "Juan Dela Cruz");
    }

    #[test]
    fn is_admin_follows_role() {
        assert!(user(UserRole::Admin).is_admin());
        assert!(!user(UserRole::User).is_admin());
    }

    #[test]
    fn enums_serialise_snake_case() {
        assert_eq!(serde_json::to_value(AlertStatus::Acknowledged).unwrap(), "acknowledged");
        assert_eq!(serde_json::to_value(SensorStatus::Maintenance).unwrap(), "maintenance");
        assert_eq!(serde_json::to_value(ReadingStatus::Critical).unwrap(), "critical");
        assert_eq!(
            serde_json::from_value::<UserRole>(serde_json::json!("admin")).unwrap(),
            UserRole::Admin
        );
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(AlertStatus::Resolved.to_string(), "resolved");
    }
}
