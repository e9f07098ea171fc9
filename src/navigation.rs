use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::UserRole;

/// One entry of the dashboard side menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub url: String,
    pub permission: String,
}

impl MenuItem {
    fn new(id: &str, title: &str, icon: &str, url: &str, permission: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            icon: icon.to_owned(),
            url: url.to_owned(),
            permission: permission.to_owned(),
        }
    }
}

/// Menu for `role`. Admins additionally get staff management, placed just
/// before settings.
pub fn menu_for(role: UserRole) -> Vec<MenuItem> {
    let mut menu = vec![
        MenuItem::new("monitoring", "Monitoring", "🏠", "monitoring.html", "view_monitoring"),
        MenuItem::new("sensors", "Sensors", "📡", "sensors.html", "view_sensors"),
        MenuItem::new("alerts", "Alert Section", "⚠️", "alert_sections.html", "view_alerts"),
        MenuItem::new("settings", "Settings", "⚙️", "settings.html", "view_settings"),
    ];

    if role == UserRole::Admin {
        let at = menu.len() - 1;
        menu.insert(
            at,
            MenuItem::new(
                "staff_management",
                "Staff Management",
                "👥",
                "user_management.html",
                "manage_users",
            ),
        );
    }

    menu
}
