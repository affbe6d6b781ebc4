use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    status: String,
    version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

/// Liveness plus a database round trip.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<HealthData>),
        (status = 500, description = "Database unreachable"),
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HealthData>>> {
    sqlx::query("SELECT 1").execute(&state.pool).await?;
    let data = HealthData {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Ok(Json(ApiResponse::success(
        "Ready",
        data,
        Some(Meta::empty()),
    )))
}
