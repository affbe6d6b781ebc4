use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::{
            CreateSkuRequest, OrderList, RegistrationBoard, RegistrationQuery, SkuUpdate,
            SkuUpdateRequest, SlotQuotaRequest, SweepReport, UpdateOrderStatusRequest,
        },
        catalog::{SkuDetail, SkuList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Sku, Slot},
    response::{Ack, ApiResponse},
    routes::params::{CatalogQuery, OrderListQuery},
    services::{admin_service, sku_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/invoice", post(attach_invoice))
        .route("/registrations", get(list_registrations))
        .route("/skus", get(list_skus).post(create_sku))
        .route(
            "/skus/{sku}",
            get(get_sku).put(update_sku).delete(delete_sku),
        )
        .route("/skus/{sku}/slots", put(set_slot_quota))
        .route("/sku-update", post(sku_update))
        .route("/sweep", post(sweep_reservations))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sku" = Option<String>, Query, description = "Filter by SKU code"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed or slot full"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/invoice",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Invoice stored; pending orders become confirmed", body = ApiResponse<Order>),
        (status = 400, description = "Order cannot be invoiced"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn attach_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::attach_invoice(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/registrations",
    params(
        ("view" = Option<String>, Query, description = "all, pending or completed"),
        ("sku" = Option<String>, Query, description = "SKU substring"),
    ),
    responses(
        (status = 200, description = "Orders grouped by SKU, newest first", body = ApiResponse<RegistrationBoard>),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RegistrationQuery>,
) -> AppResult<Json<ApiResponse<RegistrationBoard>>> {
    let resp = admin_service::list_registrations(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/skus",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search SKU code or name"),
    ),
    responses(
        (status = 200, description = "All SKUs including inactive", body = ApiResponse<SkuList>),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_skus(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<ApiResponse<SkuList>>> {
    let resp = sku_service::list_skus(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/skus",
    request_body = CreateSkuRequest,
    responses(
        (status = 200, description = "SKU and its slots created", body = ApiResponse<Sku>),
        (status = 400, description = "Invalid SKU"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSkuRequest>,
) -> AppResult<Json<ApiResponse<Sku>>> {
    let resp = sku_service::create_sku(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/skus/{sku}",
    params(("sku" = String, Path, description = "SKU code")),
    responses(
        (status = 200, description = "SKU with slots", body = ApiResponse<SkuDetail>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<SkuDetail>>> {
    let resp = sku_service::get_sku(&state, &user, &sku).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/skus/{sku}",
    params(("sku" = String, Path, description = "Current SKU code")),
    request_body = SkuUpdate,
    responses(
        (status = 200, description = "SKU updated", body = ApiResponse<Sku>),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
    Json(payload): Json<SkuUpdate>,
) -> AppResult<Json<ApiResponse<Sku>>> {
    let resp = sku_service::update_sku(&state, &user, &sku, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/sku-update",
    request_body = SkuUpdateRequest,
    responses(
        (status = 200, description = "SKU updated", body = ApiResponse<Sku>),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sku_update(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SkuUpdateRequest>,
) -> AppResult<Json<ApiResponse<Sku>>> {
    let resp = sku_service::update_sku(&state, &user, &payload.original_sku, payload.update).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/skus/{sku}",
    params(("sku" = String, Path, description = "SKU code")),
    responses(
        (status = 200, description = "SKU deleted", body = ApiResponse<Ack>),
        (status = 400, description = "SKU has orders"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let resp = sku_service::delete_sku(&state, &user, &sku).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/skus/{sku}/slots",
    params(("sku" = String, Path, description = "SKU code")),
    request_body = SlotQuotaRequest,
    responses(
        (status = 200, description = "Slot quota updated", body = ApiResponse<Slot>),
        (status = 404, description = "Unknown slot"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_slot_quota(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
    Json(payload): Json<SlotQuotaRequest>,
) -> AppResult<Json<ApiResponse<Slot>>> {
    let resp = sku_service::set_slot_quota(&state, &user, &sku, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/sweep",
    responses(
        (status = 200, description = "Expired reservations released", body = ApiResponse<SweepReport>),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sweep_reservations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SweepReport>>> {
    let resp = admin_service::sweep_reservations(&state, &user).await?;
    Ok(Json(resp))
}
