pub mod dto;
pub mod envelope;
pub mod errors;
pub mod extract;
pub mod handlers;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{auth::SessionStore, config::SessionConfig, monitoring::MonitoringService};
use handlers::ApiDoc;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sessions: SessionStore,
    pub monitoring: MonitoringService,
}

impl AppState {
    pub fn new(pool: PgPool, session_config: SessionConfig) -> Self {
        Self {
            sessions: SessionStore::new(pool.clone(), session_config),
            monitoring: MonitoringService::new(pool.clone()),
            pool,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        // auth
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        // profile
        .route(
            "/api/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route("/api/profile/password", post(handlers::profile::change_password))
        .route("/api/navigation", get(handlers::navigation::get_navigation))
        // sensors
        .route(
            "/api/sensors",
            get(handlers::sensors::list_sensors).post(handlers::sensors::create_sensor),
        )
        .route(
            "/api/sensors/{id}",
            get(handlers::sensors::get_sensor)
                .put(handlers::sensors::update_sensor)
                .delete(handlers::sensors::delete_sensor),
        )
        .route(
            "/api/sensors/{id}/readings",
            get(handlers::sensors::get_sensor_readings),
        )
        // alerts
        .route(
            "/api/alerts",
            get(handlers::alerts::list_alerts).post(handlers::alerts::create_alert),
        )
        .route("/api/alerts/{id}", put(handlers::alerts::update_alert))
        // monitoring
        .route("/api/monitoring", get(handlers::monitoring::get_snapshot))
        .route(
            "/api/monitoring/readings",
            post(handlers::monitoring::record_reading),
        )
        // floor plans
        .route(
            "/api/floor-plans",
            get(handlers::floor_plans::list_floor_plans)
                .post(handlers::floor_plans::create_floor_plan),
        )
        .route(
            "/api/floor-plans/{id}",
            axum::routing::delete(handlers::floor_plans::delete_floor_plan),
        )
        // users
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(TraceLayer::new_for_http())
}

/// CORS for the dashboard. No configured origins means any origin, which
/// rules out credentialed requests; list origins explicitly to allow cookies.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}
