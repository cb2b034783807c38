/// Billing endpoints
///
/// # Endpoints
///
/// ```text
/// POST /api/v1/billings/bulk-monthly   # Generate monthly billings
/// GET  /api/v1/billings/penghuni       # Occupant billing report
/// GET  /api/v1/billings/:id            # Single billing
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    middleware::auth::RequestUser,
    response::{parse_id, ApiResponse},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use ipl_shared::{
    billing::{BulkBillingReport, OccupantBillingSummary},
    models::billing::Billing,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Bulk monthly billing request
///
/// Year bounds are configurable and checked by the billing service.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkBillingRequest {
    /// Users to bill; omitted or empty bills every occupant
    #[serde(default)]
    pub user_ids: Option<Vec<i32>>,

    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: i32,

    pub year: i32,
}

/// Generate billings for (user, active monthly setting) pairs
///
/// # Request Body
///
/// ```json
/// { "user_ids": [1, 2], "month": 3, "year": 2025 }
/// ```
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "message": "Bulk billings created successfully",
///   "data": { "total_users": 2, "total_billings": 4, "success_count": 4, "failed_count": 0 }
/// }
/// ```
///
/// # Errors
///
/// - 400: malformed JSON
/// - 422: month or year out of range
/// - 500: lookup failure, or a batch failed (`details` carries `persisted` and `lost`)
pub async fn create_bulk_monthly(
    State(state): State<AppState>,
    caller: Option<Extension<RequestUser>>,
    ValidatedJson(req): ValidatedJson<BulkBillingRequest>,
) -> ApiResult<Json<ApiResponse<BulkBillingReport>>> {
    tracing::info!(
        month = req.month,
        year = req.year,
        requested_users = req.user_ids.as_ref().map(Vec::len),
        caller_id = caller.as_ref().map(|Extension(user)| user.id),
        "Bulk monthly billing requested"
    );

    let report = state
        .billing
        .create_monthly_billings(req.user_ids, req.month, req.year)
        .await?;

    Ok(Json(ApiResponse::success(
        "Bulk billings created successfully",
        report,
    )))
}

/// Billing totals per occupant and period
///
/// Occupants without billings are not listed; an empty list is a success.
pub async fn billing_penghuni(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<OccupantBillingSummary>>>> {
    let summaries = state.billing.occupant_billing_report().await?;

    Ok(Json(ApiResponse::success(
        "Billing penghuni retrieved successfully",
        summaries,
    )))
}

/// Single billing by ID
///
/// # Errors
///
/// - 400: the ID is not a positive integer
/// - 404: no billing has this ID
pub async fn get_billing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Billing>>> {
    let id = parse_id(&id)?;

    let billing = Billing::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Billing not found".to_string()))?;

    Ok(Json(ApiResponse::success(
        "Billing retrieved successfully",
        billing,
    )))
}
