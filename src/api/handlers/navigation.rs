use axum::Json;

use crate::{
    api::{
        dto::{NavigationDto, SessionUserDto},
        envelope::{ApiResponse, ApiResult, ErrorBody},
        extract::CurrentUser,
    },
    navigation::menu_for,
};

/// Side menu for the signed-in user's role.
#[utoipa::path(
    get,
    path = "/api/navigation",
    responses(
        (status = 200, description = "User summary and menu", body = ApiResponse<NavigationDto>),
        (status = 401, description = "Not logged in", body = ErrorBody),
    ),
    tag = "profile"
)]
pub async fn get_navigation(current: CurrentUser) -> ApiResult<NavigationDto> {
    Ok(Json(ApiResponse::data(NavigationDto {
        user: SessionUserDto::from(&current.user),
        menu: menu_for(current.user.role),
    })))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use sqlx::PgPool;

    use crate::api::handlers::test_support::*;

    fn menu_ids(body: &Value) -> Vec<String> {
        body["data"]["menu"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_owned())
            .collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn admin_menu_has_staff_management(pool: PgPool) {
        let (_, admin) = user_session(&pool, "admin").await;
        let (_, user) = user_session(&pool, "user").await;
        let server = test_server(pool);

        let body: Value = server.get("/api/navigation").authorization_bearer(&admin).await.json();
        assert_eq!(body["data"]["user"]["role"], "admin");
        assert_eq!(
            menu_ids(&body),
            ["monitoring", "sensors", "alerts", "staff_management", "settings"]
        );

        let body: Value = server.get("/api/navigation").authorization_bearer(&user).await.json();
        assert_eq!(menu_ids(&body), ["monitoring", "sensors", "alerts", "settings"]);
    }
}
