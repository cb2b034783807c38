/// Role menu management endpoints
///
/// # Endpoints
///
/// ```text
/// POST   /api/v1/role-menus                                # Create role menu
/// GET    /api/v1/role-menus                                # List role menus (?page=&limit=)
/// GET    /api/v1/role-menus/:id                            # Get role menu with links
/// PUT    /api/v1/role-menus/:id                            # Update role menu
/// DELETE /api/v1/role-menus/:id                            # Delete role menu and its links
/// POST   /api/v1/role-menus/:id/master-menus               # Link a master menu
/// DELETE /api/v1/role-menus/:id/master-menus/:master_menu_id
/// POST   /api/v1/role-menus/:id/roles                      # Link a role
/// DELETE /api/v1/role-menus/:id/roles/:role_id
/// GET    /api/v1/roles/:role_id/role-menus                 # Role menus of a role
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    response::{parse_id, ApiResponse, PageParams, PaginatedResponse, Pagination},
    routes::menus::MenuResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use ipl_shared::models::menu::MasterMenu;
use ipl_shared::models::role_menu::{
    CreateRoleMenu, Role, RoleMenu, RoleMenuWithRelations, UpdateRoleMenu,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Role as returned inside a role menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: i32,
    pub document_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub role_type: Option<String>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            document_id: role.document_id,
            name: role.name,
            description: role.description,
            role_type: role.role_type,
        }
    }
}

/// Role menu with its linked master menus and roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMenuResponse {
    pub id: i32,
    pub document_id: Option<String>,
    pub role_menu_ord: Option<f64>,
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub master_menus: Vec<MenuResponse>,
    pub roles: Vec<RoleResponse>,
}

impl From<RoleMenuWithRelations> for RoleMenuResponse {
    fn from(loaded: RoleMenuWithRelations) -> Self {
        let role_menu = loaded.role_menu;
        Self {
            id: role_menu.id,
            document_id: role_menu.document_id,
            role_menu_ord: role_menu.sort_order,
            is_active: role_menu.is_active,
            created_at: role_menu.created_at,
            updated_at: role_menu.updated_at,
            published_at: role_menu.published_at,
            master_menus: loaded.master_menus.into_iter().map(MenuResponse::from).collect(),
            roles: loaded.roles.into_iter().map(RoleResponse::from).collect(),
        }
    }
}

impl From<RoleMenu> for RoleMenuResponse {
    fn from(role_menu: RoleMenu) -> Self {
        RoleMenuWithRelations {
            role_menu,
            master_menus: Vec::new(),
            roles: Vec::new(),
        }
        .into()
    }
}

/// Create role menu request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateRoleMenuRequest {
    pub document_id: Option<String>,

    #[validate(range(min = 0.0, message = "role_menu_ord must not be negative"))]
    pub role_menu_ord: Option<f64>,

    pub is_active: Option<bool>,
}

/// Update role menu request (omitted fields are left unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRoleMenuRequest {
    pub document_id: Option<String>,

    #[validate(range(min = 0.0, message = "role_menu_ord must not be negative"))]
    pub role_menu_ord: Option<f64>,

    pub is_active: Option<bool>,
}

/// Link a master menu to a role menu
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachMasterMenuRequest {
    #[validate(range(min = 1, message = "master_menu_id must be a positive integer"))]
    pub master_menu_id: i32,

    /// Position of the menu within the role menu
    pub order: Option<f64>,
}

/// Link a role to a role menu
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AttachRoleRequest {
    #[validate(range(min = 1, message = "role_id must be a positive integer"))]
    pub role_id: i32,

    /// Position of the role menu within the role
    pub order: Option<f64>,
}

impl From<CreateRoleMenuRequest> for CreateRoleMenu {
    fn from(req: CreateRoleMenuRequest) -> Self {
        Self {
            document_id: req.document_id,
            sort_order: req.role_menu_ord,
            is_active: req.is_active,
        }
    }
}

impl From<UpdateRoleMenuRequest> for UpdateRoleMenu {
    fn from(req: UpdateRoleMenuRequest) -> Self {
        Self {
            document_id: req.document_id,
            sort_order: req.role_menu_ord,
            is_active: req.is_active,
        }
    }
}

fn role_menu_not_found() -> ApiError {
    ApiError::NotFound("Role menu not found".to_string())
}

async fn ensure_role_menu(state: &AppState, id: i32) -> ApiResult<()> {
    match RoleMenu::find_by_id(&state.db, id).await? {
        Some(_) => Ok(()),
        None => Err(role_menu_not_found()),
    }
}

/// Create a role menu
///
/// The new role menu has no links; attach master menus and roles afterwards.
pub async fn create_role_menu(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRoleMenuRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RoleMenuResponse>>)> {
    let role_menu = RoleMenu::create(&state.db, req.into()).await?;

    tracing::info!(role_menu_id = role_menu.id, "Role menu created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Role menu created successfully",
            role_menu.into(),
        )),
    ))
}

/// List role menus with their links
///
/// # Query Parameters
///
/// - `page`: page number, default 1
/// - `limit`: page size 1-100, default 10
pub async fn list_role_menus(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PaginatedResponse<RoleMenuResponse>>> {
    let (page, limit) = (params.page(), params.limit());

    let role_menus = RoleMenu::list(&state.db, limit, params.offset()).await?;
    let total = RoleMenu::count(&state.db).await?;
    let loaded = RoleMenu::with_relations(&state.db, role_menus).await?;

    Ok(Json(PaginatedResponse::new(
        "Role menus retrieved successfully",
        loaded.into_iter().map(RoleMenuResponse::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Get a role menu with its master menus and roles
pub async fn get_role_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<RoleMenuResponse>>> {
    let id = parse_id(&id)?;

    let loaded = RoleMenu::find_with_relations(&state.db, id)
        .await?
        .ok_or_else(role_menu_not_found)?;

    Ok(Json(ApiResponse::success(
        "Role menu retrieved successfully",
        loaded.into(),
    )))
}

/// Update a role menu
///
/// # Errors
///
/// - 400: no field given
/// - 404: no role menu has this ID
pub async fn update_role_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateRoleMenuRequest>,
) -> ApiResult<Json<ApiResponse<RoleMenuResponse>>> {
    let id = parse_id(&id)?;
    let update: UpdateRoleMenu = req.into();

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let role_menu = RoleMenu::update(&state.db, id, update)
        .await?
        .ok_or_else(role_menu_not_found)?;

    tracing::info!(role_menu_id = role_menu.id, "Role menu updated");

    let mut loaded = RoleMenu::with_relations(&state.db, vec![role_menu]).await?;
    let loaded = loaded.pop().ok_or_else(role_menu_not_found)?;

    Ok(Json(ApiResponse::success(
        "Role menu updated successfully",
        loaded.into(),
    )))
}

/// Delete a role menu and its links
pub async fn delete_role_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;

    if !RoleMenu::delete(&state.db, id).await? {
        return Err(role_menu_not_found());
    }

    tracing::info!(role_menu_id = id, "Role menu deleted");

    Ok(Json(ApiResponse::success(
        "Role menu deleted successfully",
        (),
    )))
}

/// Role menus linked to a role, in the role link's order
///
/// An unknown role gets an empty list.
pub async fn get_role_menus_by_role(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<RoleMenuResponse>>>> {
    let role_id = parse_id(&role_id)?;

    let role_menus = RoleMenu::find_by_role_id(&state.db, role_id).await?;
    let loaded = RoleMenu::with_relations(&state.db, role_menus).await?;

    Ok(Json(ApiResponse::success(
        "Role menus retrieved successfully",
        loaded.into_iter().map(RoleMenuResponse::from).collect(),
    )))
}

/// Link a master menu to a role menu
///
/// Linking a menu that is already linked replaces its order.
///
/// # Errors
///
/// - 404: the role menu or the master menu does not exist
pub async fn attach_master_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AttachMasterMenuRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;

    ensure_role_menu(&state, id).await?;
    if MasterMenu::find_by_id(&state.db, req.master_menu_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Master menu not found".to_string()));
    }

    RoleMenu::attach_master_menu(&state.db, id, req.master_menu_id, req.order).await?;

    tracing::info!(
        role_menu_id = id,
        master_menu_id = req.master_menu_id,
        "Master menu attached to role menu"
    );

    Ok(Json(ApiResponse::success(
        "Master menu attached successfully",
        (),
    )))
}

/// Remove a master menu link
///
/// Removing a link that does not exist is not an error.
pub async fn detach_master_menu(
    State(state): State<AppState>,
    Path((id, master_menu_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    let master_menu_id = parse_id(&master_menu_id)?;

    ensure_role_menu(&state, id).await?;

    let removed = RoleMenu::detach_master_menu(&state.db, id, master_menu_id).await?;

    tracing::info!(
        role_menu_id = id,
        master_menu_id,
        removed,
        "Master menu detached from role menu"
    );

    Ok(Json(ApiResponse::success(
        "Master menu detached successfully",
        (),
    )))
}

/// Link a role to a role menu
///
/// Linking a role that is already linked replaces its order.
///
/// # Errors
///
/// - 404: the role menu or the role does not exist
pub async fn attach_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<AttachRoleRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;

    ensure_role_menu(&state, id).await?;
    if Role::find_by_id(&state.db, req.role_id).await?.is_none() {
        return Err(ApiError::NotFound("Role not found".to_string()));
    }

    RoleMenu::attach_role(&state.db, id, req.role_id, req.order).await?;

    tracing::info!(role_menu_id = id, role_id = req.role_id, "Role attached to role menu");

    Ok(Json(ApiResponse::success("Role attached successfully", ())))
}

/// Remove a role link
///
/// Removing a link that does not exist is not an error.
pub async fn detach_role(
    State(state): State<AppState>,
    Path((id, role_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    let role_id = parse_id(&role_id)?;

    ensure_role_menu(&state, id).await?;

    let removed = RoleMenu::detach_role(&state.db, id, role_id).await?;

    tracing::info!(role_menu_id = id, role_id, removed, "Role detached from role menu");

    Ok(Json(ApiResponse::success("Role detached successfully", ())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req: CreateRoleMenuRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: CreateRoleMenuRequest =
            serde_json::from_str(r#"{"role_menu_ord": 1.5, "is_active": true}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: CreateRoleMenuRequest =
            serde_json::from_str(r#"{"role_menu_ord": -1}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_maps_to_partial_update() {
        let req: UpdateRoleMenuRequest =
            serde_json::from_str(r#"{"is_active": false}"#).unwrap();
        let update: UpdateRoleMenu = req.into();
        assert_eq!(update.is_active, Some(false));
        assert!(update.sort_order.is_none());
        assert!(!update.is_empty());

        let update: UpdateRoleMenu = UpdateRoleMenuRequest::default().into();
        assert!(update.is_empty());
    }

    #[test]
    fn test_attach_requests_need_positive_ids() {
        let req: AttachMasterMenuRequest =
            serde_json::from_str(r#"{"master_menu_id": 3, "order": 2}"#).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.order, Some(2.0));

        let req: AttachMasterMenuRequest =
            serde_json::from_str(r#"{"master_menu_id": 0}"#).unwrap();
        assert!(req.validate().is_err());

        let req: AttachRoleRequest = serde_json::from_str(r#"{"role_id": -4}"#).unwrap();
        assert!(req.validate().is_err());

        // role_id is required
        assert!(serde_json::from_str::<AttachRoleRequest>(r#"{"order": 1}"#).is_err());
    }

    #[test]
    fn test_role_response_uses_type_key() {
        let role = RoleResponse::from(Role {
            id: 2,
            document_id: None,
            name: Some("Penghuni".to_string()),
            description: None,
            role_type: Some("penghuni".to_string()),
        });

        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["type"], "penghuni");
        assert!(json.get("role_type").is_none());
    }

    #[test]
    fn test_new_role_menu_has_no_links() {
        let now = Utc::now();
        let response = RoleMenuResponse::from(RoleMenu {
            id: 5,
            document_id: Some("rm-5".to_string()),
            sort_order: Some(3.0),
            is_active: None,
            created_at: now,
            updated_at: now,
            published_at: Some(now),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["role_menu_ord"], 3.0);
        assert_eq!(json["master_menus"], serde_json::json!([]));
        assert_eq!(json["roles"], serde_json::json!([]));
    }
}
