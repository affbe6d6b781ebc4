use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::OrderStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReelsOrderRequest {
    pub name: String,
    pub whatsapp: String,
    pub sku: String,
    pub color: String,
    pub size: String,
    /// Defaults to 1.
    pub quantity: Option<i32>,
}

/// Outcome of a booking attempt against a slot's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Booked,
    Waitlisted,
    Duplicate,
    Closed,
    InvalidVariation,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReelsOrderResponse {
    pub status: BookingStatus,
    pub order_id: Option<Uuid>,
    pub order_status: Option<OrderStatus>,
    /// Units left in the slot after this booking.
    pub remaining: i64,
}
