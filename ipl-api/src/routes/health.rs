/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Service is healthy",
///   "data": { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// }
/// ```

use crate::{app::AppState, error::ApiResult, response::ApiResponse};
use axum::{extract::State, Json};
use ipl_shared::db::pool::health_check as database_health_check;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,
}

/// Health check handler
///
/// A database outage is reported as `degraded` rather than as an error.
pub async fn health_check(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<HealthResponse>>> {
    let connected = match database_health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    let (status, message) = if connected {
        ("healthy", "Service is healthy")
    } else {
        ("degraded", "Service is degraded")
    };

    Ok(Json(ApiResponse::success(
        message,
        HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if connected { "connected" } else { "disconnected" }.to_string(),
        },
    )))
}
