/// Menu endpoints
///
/// ```text
/// GET /api/v1/menus/user/:id   # Active menus granted to the user's roles
/// ```

use crate::{
    app::AppState,
    error::ApiResult,
    response::{parse_id, ApiResponse},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use ipl_shared::models::menu::MasterMenu;
use serde::{Deserialize, Serialize};

/// Menu as returned to the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuResponse {
    pub id: i32,
    pub document_id: Option<String>,
    pub nama_menu: String,
    pub kode_menu: String,
    pub urutan_menu: Option<i32>,
    pub is_active: Option<bool>,
    pub locale: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<MasterMenu> for MenuResponse {
    fn from(menu: MasterMenu) -> Self {
        Self {
            id: menu.id,
            document_id: menu.document_id,
            nama_menu: menu.name,
            kode_menu: menu.code,
            urutan_menu: menu.sort_order,
            is_active: menu.is_active,
            locale: menu.locale,
            created_at: menu.created_at,
            updated_at: menu.updated_at,
            published_at: menu.published_at,
        }
    }
}

/// Menus for a user
///
/// A user without any granted menu gets an empty list.
pub async fn get_menus_by_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<MenuResponse>>>> {
    let user_id = parse_id(&id)?;

    let menus = MasterMenu::find_active_by_user_id(&state.db, user_id).await?;

    let message = if menus.is_empty() {
        "No menus found for this user"
    } else {
        "Menus retrieved successfully"
    };

    Ok(Json(ApiResponse::success(
        message,
        menus.into_iter().map(MenuResponse::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_response_uses_column_names() {
        let now = Utc::now();
        let menu = MasterMenu {
            id: 1,
            document_id: None,
            name: "Tagihan".to_string(),
            code: "BILLING".to_string(),
            sort_order: Some(2),
            is_active: Some(true),
            locale: None,
            created_at: now,
            updated_at: now,
            published_at: Some(now),
        };

        let json = serde_json::to_value(MenuResponse::from(menu)).unwrap();
        assert_eq!(json["nama_menu"], "Tagihan");
        assert_eq!(json["kode_menu"], "BILLING");
        assert_eq!(json["urutan_menu"], 2);
    }
}
