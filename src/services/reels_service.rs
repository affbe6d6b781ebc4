use chrono::Utc;
use sea_orm::{EntityTrait, TransactionTrait};

use crate::{
    audit,
    dto::reels::{BookingStatus, CreateReelsOrderRequest, ReelsOrderResponse},
    entity::skus::Entity as Skus,
    error::{AppError, AppResult},
    events::{EventKind, StoreEvent},
    models::{OrderStatus, normalize_whatsapp},
    response::{ApiResponse, Meta},
    services::reservation_service::{BookingRequest, book_slot, publish_promotions, reservation_ttl},
    state::AppState,
};

pub const MAX_QUANTITY: i32 = 10;

pub struct CustomerContact {
    pub name: String,
    pub whatsapp: String,
}

pub fn validate_contact(name: &str, whatsapp: &str) -> AppResult<CustomerContact> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    let whatsapp = normalize_whatsapp(whatsapp)
        .ok_or_else(|| AppError::BadRequest("invalid WhatsApp number".into()))?;
    Ok(CustomerContact {
        name: name.to_string(),
        whatsapp,
    })
}

pub fn validate_quantity(quantity: i32) -> AppResult<i32> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::BadRequest(format!(
            "quantity must be between 1 and {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

pub fn booking_message(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Booked => "Order booked",
        BookingStatus::Waitlisted => "Quota full, added to waitlist",
        BookingStatus::Duplicate => "Already booked for this variation",
        BookingStatus::Closed => "Sale is closed",
        BookingStatus::InvalidVariation => "Variation not available",
    }
}

/// Book a flash-sale slot straight from the feed.
pub async fn create_reels_order_with_quota(
    state: &AppState,
    payload: CreateReelsOrderRequest,
) -> AppResult<ApiResponse<ReelsOrderResponse>> {
    let contact = validate_contact(&payload.name, &payload.whatsapp)?;
    let quantity = validate_quantity(payload.quantity.unwrap_or(1))?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let sku = Skus::find_by_id(payload.sku.trim().to_string())
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let outcome = book_slot(
        &txn,
        BookingRequest {
            sku: &sku,
            color: payload.color.trim(),
            size: payload.size.trim(),
            customer_name: &contact.name,
            whatsapp: &contact.whatsapp,
            quantity,
            cart_session_id: None,
            cart_item: None,
        },
        now,
        reservation_ttl(&state.config),
    )
    .await?;
    txn.commit().await?;

    publish_promotions(state, &outcome.promoted);

    let order_status = match &outcome.order {
        Some(order) => Some(
            order
                .status
                .parse::<OrderStatus>()
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
        ),
        None => None,
    };

    if let (Some(order), BookingStatus::Booked | BookingStatus::Waitlisted) =
        (&outcome.order, outcome.status)
    {
        tracing::info!(
            order_id = %order.id,
            sku = %order.sku,
            status = %order.status,
            "reels order created"
        );
        state.events.publish(
            StoreEvent::new(EventKind::OrderCreated, order.id, order.sku.clone())
                .with_status(order.status.clone()),
        );
        audit::record(
            &state.pool,
            Some(contact.whatsapp.as_str()),
            "reels_order_create",
            "orders",
            serde_json::json!({ "order_id": order.id, "sku": order.sku, "status": order.status }),
        )
        .await;
    }

    let data = ReelsOrderResponse {
        status: outcome.status,
        order_id: outcome.order.as_ref().map(|o| o.id),
        order_status,
        remaining: outcome.remaining,
    };
    Ok(ApiResponse::success(
        booking_message(outcome.status),
        data,
        Some(Meta::empty()),
    ))
}
