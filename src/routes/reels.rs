use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::reels::{CreateReelsOrderRequest, ReelsOrderResponse},
    error::AppResult,
    response::ApiResponse,
    services::reels_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders", post(create_reels_order))
}

#[utoipa::path(
    post,
    path = "/api/reels/orders",
    request_body = CreateReelsOrderRequest,
    responses(
        (status = 200, description = "booked, waitlisted, duplicate, closed or invalid_variation", body = ApiResponse<ReelsOrderResponse>),
        (status = 400, description = "Invalid contact or quantity"),
        (status = 404, description = "Unknown SKU"),
    ),
    tag = "Reels"
)]
pub async fn create_reels_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateReelsOrderRequest>,
) -> AppResult<Json<ApiResponse<ReelsOrderResponse>>> {
    let resp = reels_service::create_reels_order_with_quota(&state, payload).await?;
    Ok(Json(resp))
}
