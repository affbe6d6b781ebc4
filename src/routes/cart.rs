use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddToCartRequest, AddToCartResponse, CartSessionResponse, CartView, SubmitCartRequest,
        SubmitCartResponse,
    },
    error::AppResult,
    middleware::cart_token::CartToken,
    response::{Ack, ApiResponse},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/", get(get_cart))
        .route("/items", post(add_to_cart))
        .route("/items/{id}", delete(remove_from_cart))
        .route("/submit", post(submit_cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/session",
    responses(
        (status = 200, description = "New cart token", body = ApiResponse<CartSessionResponse>)
    ),
    tag = "Cart"
)]
pub async fn create_session(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CartSessionResponse>>> {
    let resp = cart_service::create_session(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("x-cart-token" = String, Header, description = "Cart token")),
    responses(
        (status = 200, description = "Cart items with reservation state", body = ApiResponse<CartView>),
        (status = 400, description = "Missing or invalid cart token"),
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    token: CartToken,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::get_cart(&state, &token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    params(("x-cart-token" = String, Header, description = "Cart token")),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "reserved, waitlist, closed or invalid_variation", body = ApiResponse<AddToCartResponse>),
        (status = 400, description = "Invalid quantity or token"),
        (status = 404, description = "Unknown SKU"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    token: CartToken,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<AddToCartResponse>>> {
    let resp = cart_service::add_to_cart(&state, &token, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID"),
        ("x-cart-token" = String, Header, description = "Cart token"),
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<Ack>),
        (status = 404, description = "Not in this cart"),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    token: CartToken,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ack>>> {
    let resp = cart_service::remove_from_cart(&state, &token, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/submit",
    params(("x-cart-token" = String, Header, description = "Cart token")),
    request_body = SubmitCartRequest,
    responses(
        (status = 200, description = "Per-item booking results", body = ApiResponse<SubmitCartResponse>),
        (status = 400, description = "Empty cart or invalid contact"),
    ),
    tag = "Cart"
)]
pub async fn submit_cart(
    State(state): State<AppState>,
    token: CartToken,
    Json(payload): Json<SubmitCartRequest>,
) -> AppResult<Json<ApiResponse<SubmitCartResponse>>> {
    let resp = cart_service::submit_cart_to_reels_order(&state, &token, payload).await?;
    Ok(Json(resp))
}
