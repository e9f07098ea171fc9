pub mod service;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{Alert, FloorPlan, ReadingStatus, Sensor, SensorReading};

pub use service::{MonitoringError, MonitoringService};

/// Number of active alerts included in a dashboard snapshot.
pub const SNAPSHOT_ALERT_LIMIT: i64 = 10;

/// Result of ingesting one reading.
#[derive(Debug, Clone)]
pub struct ReadingOutcome {
    pub reading: SensorReading,
    /// Present when the reading breached the sensor threshold.
    pub alert: Option<Alert>,
}

/// Dashboard counters for `GET /api/monitoring`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonitoringStatistics {
    pub total_sensors: i64,
    pub critical_sensors: i64,
    /// Every active alert in the table. This can exceed the number of alerts
    /// listed in the snapshot, which stops at [`SNAPSHOT_ALERT_LIMIT`].
    pub active_alerts: i64,
    pub normal_sensors: i64,
}

#[derive(Debug, Clone)]
pub struct MonitoringSnapshot {
    pub statistics: MonitoringStatistics,
    pub sensors: Vec<Sensor>,
    pub floor_plans: Vec<FloorPlan>,
    pub alerts: Vec<Alert>,
}

/// Strictly greater than: a reading equal to the threshold is still normal.
#[inline]
pub fn exceeds_threshold(value: f64, threshold: f64) -> bool {
    value > threshold
}

pub fn classify(value: f64, threshold: f64) -> ReadingStatus {
    if exceeds_threshold(value, threshold) {
        ReadingStatus::Critical
    } else {
        ReadingStatus::Normal
    }
}

/// Message stored on alerts raised by a threshold breach.
pub fn breach_message(value: f64, threshold: f64) -> String {
    format!("Sensor reading ({value}) exceeds threshold ({threshold})")
}

/// A sensor without any reading yet is never critical.
pub fn is_sensor_critical(sensor: &Sensor) -> bool {
    sensor
        .last_reading
        .is_some_and(|v| exceeds_threshold(v, sensor.threshold_value))
}

pub fn statistics(sensors: &[Sensor], active_alerts: i64) -> MonitoringStatistics {
    let total = sensors.len() as i64;
    let critical = sensors.iter().filter(|s| is_sensor_critical(s)).count() as i64;
    MonitoringStatistics {
        total_sensors: total,
        critical_sensors: critical,
        active_alerts,
        normal_sensors: total - critical,
    }
}
