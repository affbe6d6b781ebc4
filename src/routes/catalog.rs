use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{SkuDetail, SkuList},
    error::AppResult,
    response::ApiResponse,
    routes::params::CatalogQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_skus))
        .route("/{sku}", get(get_sku))
}

#[utoipa::path(
    get,
    path = "/api/skus",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search SKU code or name"),
        ("min_price" = Option<i64>, Query, description = "Minimum price"),
        ("max_price" = Option<i64>, Query, description = "Maximum price"),
        ("color" = Option<String>, Query, description = "Offered color"),
        ("size" = Option<String>, Query, description = "Offered size"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, name, deadline"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Active SKUs", body = ApiResponse<SkuList>)
    ),
    tag = "Catalog"
)]
pub async fn list_skus(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<SkuList>>> {
    let resp = catalog_service::list_skus(&state, query, false).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/skus/{sku}",
    params(("sku" = String, Path, description = "SKU code")),
    responses(
        (status = 200, description = "SKU with slot availability", body = ApiResponse<SkuDetail>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Catalog"
)]
pub async fn get_sku(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<SkuDetail>>> {
    let resp = catalog_service::get_sku(&state, &sku, false).await?;
    Ok(Json(resp))
}
