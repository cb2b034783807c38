/// Master menu management endpoints
///
/// # Endpoints
///
/// ```text
/// POST   /api/v1/master-menus       # Create master menu
/// GET    /api/v1/master-menus       # List master menus (?page=&limit=)
/// GET    /api/v1/master-menus/:id   # Get master menu
/// PUT    /api/v1/master-menus/:id   # Update master menu
/// DELETE /api/v1/master-menus/:id   # Delete master menu
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
use ipl_shared::models::menu::{CreateMasterMenu, MasterMenu, UpdateMasterMenu};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Create master menu request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMasterMenuRequest {
    #[validate(length(min = 1, max = 255, message = "nama_menu must be 1-255 characters"))]
    pub nama_menu: String,

    #[validate(length(min = 1, max = 255, message = "kode_menu must be 1-255 characters"))]
    pub kode_menu: String,

    #[validate(range(min = 0, message = "urutan_menu must not be negative"))]
    pub urutan_menu: Option<i32>,

    pub is_active: Option<bool>,

    #[validate(length(max = 16))]
    pub locale: Option<String>,

    pub document_id: Option<String>,
}

/// Update master menu request (omitted fields are left unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMasterMenuRequest {
    #[validate(length(min = 1, max = 255, message = "nama_menu must be 1-255 characters"))]
    pub nama_menu: Option<String>,

    #[validate(length(min = 1, max = 255, message = "kode_menu must be 1-255 characters"))]
    pub kode_menu: Option<String>,

    #[validate(range(min = 0, message = "urutan_menu must not be negative"))]
    pub urutan_menu: Option<i32>,

    pub is_active: Option<bool>,

    #[validate(length(max = 16))]
    pub locale: Option<String>,

    pub document_id: Option<String>,
}

impl From<CreateMasterMenuRequest> for CreateMasterMenu {
    fn from(req: CreateMasterMenuRequest) -> Self {
        Self {
            document_id: req.document_id,
            name: req.nama_menu,
            code: req.kode_menu,
            sort_order: req.urutan_menu,
            is_active: req.is_active,
            locale: req.locale,
        }
    }
}

impl From<UpdateMasterMenuRequest> for UpdateMasterMenu {
    fn from(req: UpdateMasterMenuRequest) -> Self {
        Self {
            document_id: req.document_id,
            name: req.nama_menu,
            code: req.kode_menu,
            sort_order: req.urutan_menu,
            is_active: req.is_active,
            locale: req.locale,
        }
    }
}

fn duplicate_code(code: &str) -> ApiError {
    ApiError::Conflict(format!("Master menu with kode_menu '{}' already exists", code))
}

fn menu_not_found() -> ApiError {
    ApiError::NotFound("Master menu not found".to_string())
}

/// Create a master menu
///
/// # Errors
///
/// - 409: `kode_menu` is already used
/// - 422: validation failed
pub async fn create_master_menu(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateMasterMenuRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MenuResponse>>)> {
    if MasterMenu::find_by_code(&state.db, &req.kode_menu)
        .await?
        .is_some()
    {
        return Err(duplicate_code(&req.kode_menu));
    }

    // The unique index still catches a concurrent insert (mapped to 409)
    let menu = MasterMenu::create(&state.db, req.into()).await?;

    tracing::info!(menu_id = menu.id, code = %menu.code, "Master menu created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Master menu created successfully",
            menu.into(),
        )),
    ))
}

/// List master menus
///
/// # Query Parameters
///
/// - `page`: page number, default 1
/// - `limit`: page size 1-100, default 10
///
/// Out-of-range or malformed values fall back to the defaults.
pub async fn list_master_menus(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PaginatedResponse<MenuResponse>>> {
    let (page, limit) = (params.page(), params.limit());

    let menus = MasterMenu::list(&state.db, limit, params.offset()).await?;
    let total = MasterMenu::count(&state.db).await?;

    Ok(Json(PaginatedResponse::new(
        "Master menus retrieved successfully",
        menus.into_iter().map(MenuResponse::from).collect(),
        Pagination::new(page, limit, total),
    )))
}

/// Get a master menu by ID
pub async fn get_master_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<MenuResponse>>> {
    let id = parse_id(&id)?;

    let menu = MasterMenu::find_by_id(&state.db, id)
        .await?
        .ok_or_else(menu_not_found)?;

    Ok(Json(ApiResponse::success(
        "Master menu retrieved successfully",
        menu.into(),
    )))
}

/// Update a master menu
///
/// # Errors
///
/// - 400: no field given
/// - 404: no menu has this ID
/// - 409: `kode_menu` is used by another menu
pub async fn update_master_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateMasterMenuRequest>,
) -> ApiResult<Json<ApiResponse<MenuResponse>>> {
    let id = parse_id(&id)?;
    let update: UpdateMasterMenu = req.into();

    if update.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if MasterMenu::find_by_id(&state.db, id).await?.is_none() {
        return Err(menu_not_found());
    }

    if let Some(code) = update.code.as_deref() {
        if let Some(existing) = MasterMenu::find_by_code(&state.db, code).await? {
            if existing.id != id {
                return Err(duplicate_code(code));
            }
        }
    }

    let menu = MasterMenu::update(&state.db, id, update)
        .await?
        .ok_or_else(menu_not_found)?;

    tracing::info!(menu_id = menu.id, "Master menu updated");

    Ok(Json(ApiResponse::success(
        "Master menu updated successfully",
        menu.into(),
    )))
}

/// Delete a master menu
pub async fn delete_master_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;

    if !MasterMenu::delete(&state.db, id).await? {
        return Err(menu_not_found());
    }

    tracing::info!(menu_id = id, "Master menu deleted");

    Ok(Json(ApiResponse::success(
        "Master menu deleted successfully",
        (),
    )))
}
