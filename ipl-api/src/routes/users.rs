/// User endpoints
///
/// ```text
/// GET /api/v1/users/profile/:id   # User detail by profile ID
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{parse_id, ApiResponse},
};
use axum::{
    extract::{Path, State},
    Json,
};
use ipl_shared::models::user::UserDetail;

/// User detail (profile, email and primary role) by profile ID
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<UserDetail>>> {
    let profile_id = parse_id(&id)?;

    let detail = UserDetail::find_by_profile_id(&state.db, profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(
        "User detail retrieved successfully",
        detail,
    )))
}
