pub mod models;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Shared SELECT lists so every handler returns the same joined shape.
pub(crate) mod sql {
    pub const SENSOR_SELECT: &str = r#"
        SELECT s.id, s.sensor_name, s.sensor_type, s.location, s.floor_plan_id,
               fp.floor_plan_name, s.status, s.last_reading, s.threshold_value,
               s.created_at, s.updated_at
        FROM sensors s
        LEFT JOIN floor_plans fp ON fp.id = s.floor_plan_id
    "#;

    pub const ALERT_SELECT: &str = r#"
        SELECT a.id, a.sensor_id, a.alert_type, a.message, a.status, a.created_at,
               a.resolved_at, s.sensor_name, s.location, s.sensor_type,
               s.threshold_value, s.last_reading
        FROM alerts a
        JOIN sensors s ON s.id = a.sensor_id
    "#;

    pub const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, \
                                    role, status, created_at, updated_at";
}
