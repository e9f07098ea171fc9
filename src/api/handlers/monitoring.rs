use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::api::{
    dto::{MonitoringParams, MonitoringSnapshotDto, ReadingOutcomeDto, RecordReadingRequest},
    envelope::{ApiResponse, ApiResult, ErrorBody},
    extract::CurrentUser,
    AppState,
};

/// Dashboard snapshot: sensor counters, active sensors, floor plans and the
/// most recent active alerts. Clients poll this endpoint.
#[utoipa::path(
    get,
    path = "/api/monitoring",
    params(MonitoringParams),
    responses(
        (status = 200, description = "Monitoring snapshot", body = ApiResponse<MonitoringSnapshotDto>),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "monitoring"
)]
pub async fn get_snapshot(
    _user: CurrentUser,
    State(state): State<AppState>,
    params: Result<Query<MonitoringParams>, QueryRejection>,
) -> ApiResult<MonitoringSnapshotDto> {
    let Query(params) = params?;
    let snapshot = state.monitoring.snapshot(params.floor_plan_id).await?;
    Ok(Json(ApiResponse::data(snapshot.into())))
}

/// Ingest one sensor reading. A value above the sensor's threshold raises a
/// critical alert, returned alongside the stored reading.
#[utoipa::path(
    post,
    path = "/api/monitoring/readings",
    request_body = RecordReadingRequest,
    responses(
        (status = 200, description = "Reading recorded", body = ApiResponse<ReadingOutcomeDto>),
        (status = 400, description = "Missing or non-finite reading", body = ErrorBody),
        (status = 404, description = "Sensor not found", body = ErrorBody),
    ),
    tag = "monitoring"
)]
pub async fn record_reading(
    _user: CurrentUser,
    State(state): State<AppState>,
    payload: Result<Json<RecordReadingRequest>, JsonRejection>,
) -> ApiResult<ReadingOutcomeDto> {
    let Json(req) = payload?;
    let outcome = state
        .monitoring
        .record_reading(req.sensor_id, req.reading_value)
        .await?;

    let message = if outcome.alert.is_some() {
        "Reading recorded, threshold exceeded"
    } else {
        "Reading recorded"
    };
    Ok(Json(ApiResponse::data(outcome.into()).with_message(message)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use sqlx::PgPool;

    use crate::api::handlers::test_support::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn reading_above_threshold_raises_exactly_one_critical_alert(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen LPG", 500.0, None).await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool.clone());

        let resp = server
            .post("/api/monitoring/readings")
            .authorization_bearer(&token)
            .json(&json!({ "sensor_id": sensor, "reading_value": 612.5 }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["data"]["reading"]["status"], "critical");
        assert_eq!(body["data"]["alert"]["alert_type"], "critical");
        assert_eq!(body["data"]["alert"]["status"], "active");
        assert_eq!(
            body["data"]["alert"]["message"],
            "Sensor reading (612.5) exceeds threshold (500)"
        );

        assert_eq!(count(&pool, "alerts").await, 1);
        assert_eq!(count(&pool, "sensor_readings").await, 1);
        let last: Option<f64> = sqlx::query_scalar("SELECT last_reading FROM sensors WHERE id = $1")
            .bind(sensor)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(last, Some(612.5));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reading_at_threshold_raises_nothing(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Kitchen LPG", 500.0, None).await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool.clone());

        let resp = server
            .post("/api/monitoring/readings")
            .authorization_bearer(&token)
            .json(&json!({ "sensor_id": sensor, "reading_value": 500.0 }))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["data"]["reading"]["status"], "normal");
        assert!(body["data"]["alert"].is_null());
        assert_eq!(count(&pool, "alerts").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn reading_for_unknown_sensor_is_404_and_writes_nothing(pool: PgPool) {
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool.clone());

        let resp = server
            .post("/api/monitoring/readings")
            .authorization_bearer(&token)
            .json(&json!({ "sensor_id": 404, "reading_value": 900.0 }))
            .await;
        resp.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(resp.json::<Value>()["message"], "Sensor not found");
        assert_eq!(count(&pool, "sensor_readings").await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn snapshot_counts_critical_sensors(pool: PgPool) {
        let ground = insert_floor_plan(&pool, "Ground Floor").await;
        let upper = insert_floor_plan(&pool, "Upper Floor").await;
        let hot = insert_sensor(&pool, "Boiler", 100.0, Some(ground)).await;
        insert_sensor(&pool, "Attic", 100.0, Some(upper)).await;
        insert_sensor(&pool, "Pantry", 100.0, Some(ground)).await;
        sqlx::query("UPDATE sensors SET last_reading = 250 WHERE id = $1")
            .bind(hot)
            .execute(&pool)
            .await
            .unwrap();
        insert_alert(&pool, hot, "critical", "active").await;
        insert_alert(&pool, hot, "critical", "resolved").await;
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server.get("/api/monitoring").authorization_bearer(&token).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(
            body["data"]["statistics"],
            json!({
                "total_sensors": 3,
                "critical_sensors": 1,
                "active_alerts": 1,
                "normal_sensors": 2,
            })
        );
        assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 1);
        let plans: Vec<&str> = body["data"]["floor_plans"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["floor_plan_name"].as_str().unwrap())
            .collect();
        assert_eq!(plans, ["Ground Floor", "Upper Floor"]);

        let resp = server
            .get(&format!("/api/monitoring?floor_plan_id={ground}"))
            .authorization_bearer(&token)
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let names: Vec<&str> = body["data"]["sensors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["sensor_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Boiler", "Pantry"]);
        assert_eq!(body["data"]["statistics"]["total_sensors"], 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn active_alert_count_is_not_capped_by_the_listed_alerts(pool: PgPool) {
        let sensor = insert_sensor(&pool, "Boiler", 100.0, None).await;
        for _ in 0..12 {
            insert_alert(&pool, sensor, "critical", "active").await;
        }
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server.get("/api/monitoring").authorization_bearer(&token).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["data"]["alerts"].as_array().unwrap().len(), 10);
        assert_eq!(body["data"]["statistics"]["active_alerts"], 12);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn snapshot_skips_inactive_sensors(pool: PgPool) {
        let id = insert_sensor(&pool, "Old", 100.0, None).await;
        sqlx::query("UPDATE sensors SET status = 'inactive' WHERE id = $1")
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        let (_, token) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let resp = server.get("/api/monitoring").authorization_bearer(&token).await;
        resp.assert_status_ok();
        assert_eq!(resp.json::<Value>()["data"]["statistics"]["total_sensors"], 0);
    }
}
