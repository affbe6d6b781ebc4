use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::reels::BookingStatus;

#[derive(Debug, Serialize, ToSchema)]
pub struct CartSessionResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub sku: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddToCartStatus {
    Reserved,
    Waitlist,
    Closed,
    InvalidVariation,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddToCartResponse {
    pub status: AddToCartStatus,
    pub cart_item_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub remaining: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartItemState {
    Reserved,
    Waitlist,
    Expired,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemView {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub image: Option<String>,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub state: CartItemState,
    pub expires_at: DateTime<Utc>,
    pub seconds_remaining: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    /// Sum over live reservations only.
    pub subtotal: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitCartRequest {
    pub name: String,
    pub whatsapp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitItemResult {
    pub cart_item_id: Uuid,
    pub sku: String,
    pub color: String,
    pub size: String,
    pub status: BookingStatus,
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitCartResponse {
    pub results: Vec<SubmitItemResult>,
}
