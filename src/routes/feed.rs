use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::catalog::FeedList, error::AppResult, response::ApiResponse,
    services::catalog_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_feed))
}

#[utoipa::path(
    get,
    path = "/api/feed",
    responses(
        (status = 200, description = "Open flash-sale SKUs with video", body = ApiResponse<FeedList>)
    ),
    tag = "Catalog"
)]
pub async fn list_feed(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FeedList>>> {
    let resp = catalog_service::list_feed(&state).await?;
    Ok(Json(resp))
}
