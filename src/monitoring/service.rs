use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use super::{
    breach_message, classify, statistics, MonitoringSnapshot, ReadingOutcome,
    SNAPSHOT_ALERT_LIMIT,
};
use crate::db::{
    models::{Alert, AlertStatus, AlertType, FloorPlan, ReadingStatus, Sensor, SensorReading, SensorStatus},
    sql::{ALERT_SELECT, SENSOR_SELECT},
};

#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("Sensor not found")]
    SensorNotFound(i64),

    #[error("Reading value must be a finite number")]
    InvalidReading,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct MonitoringService {
    pool: PgPool,
}

impl MonitoringService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records `value` for `sensor_id` in one transaction:
    ///
    /// 1. `sensors.last_reading` is overwritten;
    /// 2. a `sensor_readings` row is appended, classified against the threshold;
    /// 3. on a breach (`value > threshold_value`) exactly one `critical`
    ///    alert is opened.
    pub async fn record_reading(
        &self,
        sensor_id: i64,
        value: f64,
    ) -> Result<ReadingOutcome, MonitoringError> {
        if !value.is_finite() {
            return Err(MonitoringError::InvalidReading);
        }

        let mut tx = self.pool.begin().await?;

        let threshold: f64 = sqlx::query_scalar(
            r#"
            UPDATE sensors
            SET last_reading = $2, updated_at = now()
            WHERE id = $1
            RETURNING threshold_value
            "#,
        )
        .bind(sensor_id)
        .bind(value)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MonitoringError::SensorNotFound(sensor_id))?;

        let status = classify(value, threshold);

        let reading = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (sensor_id, reading_value, status)
            VALUES ($1, $2, $3)
            RETURNING id, sensor_id, reading_value, status, recorded_at
            "#,
        )
        .bind(sensor_id)
        .bind(value)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        let alert = if status == ReadingStatus::Critical {
            let alert_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO alerts (sensor_id, alert_type, message, status)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(sensor_id)
            .bind(AlertType::Critical)
            .bind(breach_message(value, threshold))
            .bind(AlertStatus::Active)
            .fetch_one(&mut *tx)
            .await?;

            let alert = sqlx::query_as::<_, Alert>(&format!("{ALERT_SELECT} WHERE a.id = $1"))
                .bind(alert_id)
                .fetch_one(&mut *tx)
                .await?;

            warn!(
                sensor_id,
                alert_id,
                reading = value,
                threshold,
                "Threshold breached, alert raised"
            );
            Some(alert)
        } else {
            None
        };

        tx.commit().await?;

        info!(sensor_id, reading = value, status = ?status, "Sensor reading recorded");
        Ok(ReadingOutcome { reading, alert })
    }

    /// Dashboard snapshot. With `floor_plan_id`, only the active sensors of
    /// that floor plan (by name); otherwise every active sensor (newest first).
    pub async fn snapshot(
        &self,
        floor_plan_id: Option<i64>,
    ) -> Result<MonitoringSnapshot, MonitoringError> {
        let sensors = match floor_plan_id {
            Some(fp) => {
                sqlx::query_as::<_, Sensor>(&format!(
                    "{SENSOR_SELECT} WHERE s.floor_plan_id = $1 AND s.status = $2 \
                     ORDER BY s.sensor_name, s.id"
                ))
                .bind(fp)
                .bind(SensorStatus::Active)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sensor>(&format!(
                    "{SENSOR_SELECT} WHERE s.status = $1 ORDER BY s.created_at DESC, s.id DESC"
                ))
                .bind(SensorStatus::Active)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let floor_plans = sqlx::query_as::<_, FloorPlan>(
            "SELECT id, floor_plan_name, created_at FROM floor_plans ORDER BY floor_plan_name",
        )
        .fetch_all(&self.pool)
        .await?;

        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "{ALERT_SELECT} WHERE a.status = $1 ORDER BY a.created_at DESC, a.id DESC LIMIT $2"
        ))
        .bind(AlertStatus::Active)
        .bind(SNAPSHOT_ALERT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let active_alerts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alerts WHERE status = $1")
            .bind(AlertStatus::Active)
            .fetch_one(&self.pool)
            .await?;

        Ok(MonitoringSnapshot {
            statistics: statistics(&sensors, active_alerts),
            sensors,
            floor_plans,
            alerts,
        })
    }
}
