use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::admin::{MonthlyQuery, MonthlyReport, TrendQuery, TrendReport},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics/monthly", get(monthly))
        .route("/analytics/trend", get(trend))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/monthly",
    params(("year" = Option<i32>, Query, description = "Calendar year, default current")),
    responses(
        (status = 200, description = "Sales per month", body = ApiResponse<MonthlyReport>),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn monthly(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MonthlyQuery>,
) -> AppResult<Json<ApiResponse<MonthlyReport>>> {
    let resp = analytics_service::monthly(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/trend",
    params(("sku" = String, Query, description = "SKU code")),
    responses(
        (status = 200, description = "Cumulative revenue per month", body = ApiResponse<TrendReport>),
        (status = 400, description = "Missing sku"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn trend(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<ApiResponse<TrendReport>>> {
    let resp = analytics_service::trend(&state, &user, query).await?;
    Ok(Json(resp))
}
