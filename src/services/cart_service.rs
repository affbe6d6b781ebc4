use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        cart::{
            AddToCartRequest, AddToCartResponse, AddToCartStatus, CartItemState, CartItemView,
            CartSessionResponse, CartView, SubmitCartRequest, SubmitCartResponse,
            SubmitItemResult,
        },
        reels::BookingStatus,
    },
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        cart_sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as CartSessions, Model as SessionModel},
        skus::{Column as SkuCol, Entity as Skus},
    },
    error::{AppError, AppResult},
    events::{EventKind, StoreEvent},
    middleware::cart_token::CartToken,
    models::{CartItemStatus, Sku},
    response::{ApiResponse, Meta},
    services::{
        convert::sku_from_entity,
        reels_service::{validate_contact, validate_quantity},
        reservation_service::{
            BookingRequest, book_slot, lock_slot, promote_waitlist, publish_promotions,
            reservation_ttl, used_units,
        },
    },
    state::AppState,
};

pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

async fn find_session<C: ConnectionTrait>(
    conn: &C,
    token: &CartToken,
) -> AppResult<Option<SessionModel>> {
    let session = CartSessions::find()
        .filter(SessionCol::Token.eq(token.as_str()))
        .one(conn)
        .await?;
    Ok(session)
}

/// Find the session for `token`, creating it on first use.
async fn ensure_session<C: ConnectionTrait>(conn: &C, token: &CartToken) -> AppResult<SessionModel> {
    let now = Utc::now();
    CartSessions::insert(SessionActive {
        id: Set(Uuid::new_v4()),
        token: Set(token.as_str().to_string()),
        created_at: Set(now.into()),
        last_seen_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::column(SessionCol::Token)
            .update_column(SessionCol::LastSeenAt)
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    find_session(conn, token)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart session vanished")))
}

pub async fn create_session(state: &AppState) -> AppResult<ApiResponse<CartSessionResponse>> {
    let token = CartToken::parse(&generate_token())?;
    let session = ensure_session(&state.orm, &token).await?;
    tracing::debug!(session_id = %session.id, "cart session created");
    Ok(ApiResponse::success(
        "Cart session created",
        CartSessionResponse { token: token.0 },
        Some(Meta::empty()),
    ))
}

fn item_state(item: &CartModel, now: DateTime<Utc>) -> CartItemState {
    match item.status.parse::<CartItemStatus>() {
        Ok(CartItemStatus::Waitlist) => CartItemState::Waitlist,
        _ if item.expires_at.with_timezone(&Utc) <= now => CartItemState::Expired,
        _ => CartItemState::Reserved,
    }
}

fn item_view(item: CartModel, sku: Option<&Sku>, now: DateTime<Utc>) -> CartItemView {
    let state = item_state(&item, now);
    let expires_at = item.expires_at.with_timezone(&Utc);
    let seconds_remaining = match state {
        CartItemState::Reserved => (expires_at - now).num_seconds().max(0),
        _ => 0,
    };
    CartItemView {
        id: item.id,
        name: sku.map(|s| s.name.clone()).unwrap_or_else(|| item.sku.clone()),
        image: sku.and_then(|s| s.images.first().cloned()),
        unit_price: sku.map(|s| s.price).unwrap_or(0),
        sku: item.sku,
        color: item.color,
        size: item.size,
        quantity: item.quantity,
        state,
        expires_at,
        seconds_remaining,
    }
}

pub fn subtotal(items: &[CartItemView]) -> i64 {
    items
        .iter()
        .filter(|item| item.state == CartItemState::Reserved)
        .map(|item| item.unit_price * i64::from(item.quantity))
        .sum()
}

async fn load_skus<C: ConnectionTrait>(conn: &C, codes: Vec<String>) -> AppResult<HashMap<String, Sku>> {
    let skus = Skus::find()
        .filter(SkuCol::Sku.is_in(codes))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.sku.clone(), sku_from_entity(model)))
        .collect();
    Ok(skus)
}

pub async fn get_cart(state: &AppState, token: &CartToken) -> AppResult<ApiResponse<CartView>> {
    let Some(session) = find_session(&state.orm, token).await? else {
        return Ok(ApiResponse::success(
            "Cart",
            CartView {
                items: Vec::new(),
                subtotal: 0,
            },
            Some(Meta::count(0)),
        ));
    };

    let items = CartItems::find()
        .filter(CartCol::SessionId.eq(session.id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let codes = items.iter().map(|item| item.sku.clone()).collect();
    let skus = load_skus(&state.orm, codes).await?;
    let now = Utc::now();

    let items: Vec<CartItemView> = items
        .into_iter()
        .map(|item| {
            let sku = skus.get(&item.sku);
            item_view(item, sku, now)
        })
        .collect();

    let meta = Meta::count(items.len());
    let cart = CartView {
        subtotal: subtotal(&items),
        items,
    };
    Ok(ApiResponse::success("Cart", cart, Some(meta)))
}

/// Reserve a slot for this cart, or queue it when the quota is taken.
/// Adding a slot that is already in the cart replaces its quantity and
/// renews the reservation.
pub async fn add_to_cart(
    state: &AppState,
    token: &CartToken,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<AddToCartResponse>> {
    let quantity = validate_quantity(payload.quantity)?;
    let now = Utc::now();
    let ttl = reservation_ttl(&state.config);

    let txn = state.orm.begin().await?;
    let session = ensure_session(&txn, token).await?;
    let sku = Skus::find_by_id(payload.sku.trim().to_string())
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let rejected = |status| AddToCartResponse {
        status,
        cart_item_id: None,
        expires_at: None,
        remaining: 0,
    };

    if !sku_from_entity(sku.clone()).is_open(now) {
        txn.commit().await?;
        return Ok(ApiResponse::success("Sale is closed", rejected(AddToCartStatus::Closed), None));
    }

    let Some(slot) = lock_slot(&txn, &sku.sku, payload.color.trim(), payload.size.trim()).await?
    else {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Variation not available",
            rejected(AddToCartStatus::InvalidVariation),
            None,
        ));
    };

    let existing = CartItems::find()
        .filter(CartCol::SessionId.eq(session.id))
        .filter(CartCol::Sku.eq(slot.sku.as_str()))
        .filter(CartCol::Color.eq(slot.color.as_str()))
        .filter(CartCol::Size.eq(slot.size.as_str()))
        .one(&txn)
        .await?;
    let existing_id = existing.as_ref().map(|item| item.id);

    let promoted = promote_waitlist(&txn, &slot, now, ttl).await?;

    let quota = i64::from(slot.quota);
    let used = used_units(&txn, &slot.sku, &slot.color, &slot.size, now, existing_id).await?;
    let fits = used + i64::from(quantity) <= quota;
    let status = if fits {
        CartItemStatus::Reserved
    } else {
        CartItemStatus::Waitlist
    };
    let expires_at = now + ttl;

    let item = match existing {
        Some(item) => {
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.status = Set(status.as_str().to_string());
            active.expires_at = Set(expires_at.into());
            active.update(&txn).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                session_id: Set(session.id),
                sku: Set(slot.sku.clone()),
                color: Set(slot.color.clone()),
                size: Set(slot.size.clone()),
                quantity: Set(quantity),
                status: Set(status.as_str().to_string()),
                expires_at: Set(expires_at.into()),
                created_at: Set(now.into()),
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;

    publish_promotions(state, &promoted.orders);
    state.events.publish(
        StoreEvent::new(EventKind::CartUpdated, item.id, item.sku.clone()).with_status(status.as_str()),
    );
    audit::record(
        &state.pool,
        Some(format!("cart:{}", session.id).as_str()),
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "sku": item.sku, "quantity": quantity, "status": status.as_str() }),
    )
    .await;

    let remaining = if fits {
        quota - used - i64::from(quantity)
    } else {
        quota - used
    };
    let (message, status) = match status {
        CartItemStatus::Reserved => ("Reserved", AddToCartStatus::Reserved),
        CartItemStatus::Waitlist => ("Quota full, added to waitlist", AddToCartStatus::Waitlist),
    };

    Ok(ApiResponse::success(
        message,
        AddToCartResponse {
            status,
            cart_item_id: Some(item.id),
            expires_at: Some(expires_at),
            remaining: remaining.max(0),
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    token: &CartToken,
    item_id: Uuid,
) -> AppResult<ApiResponse<crate::response::Ack>> {
    let session = find_session(&state.orm, token)
        .await?
        .ok_or(AppError::NotFound)?;
    let item = CartItems::find_by_id(item_id)
        .filter(CartCol::SessionId.eq(session.id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let slot = lock_slot(&txn, &item.sku, &item.color, &item.size).await?;
    let result = CartItems::delete_by_id(item.id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    let promoted = match slot {
        Some(slot) => promote_waitlist(&txn, &slot, now, reservation_ttl(&state.config)).await?,
        None => Default::default(),
    };
    txn.commit().await?;

    publish_promotions(state, &promoted.orders);
    state
        .events
        .publish(StoreEvent::new(EventKind::CartUpdated, item.id, item.sku.clone()));
    audit::record(
        &state.pool,
        Some(format!("cart:{}", session.id).as_str()),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "sku": item.sku }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        crate::response::Ack::new(item.id),
        Some(Meta::empty()),
    ))
}

/// Turn every item of the cart into a flash-sale order and empty the cart.
pub async fn submit_cart_to_reels_order(
    state: &AppState,
    token: &CartToken,
    payload: SubmitCartRequest,
) -> AppResult<ApiResponse<SubmitCartResponse>> {
    let contact = validate_contact(&payload.name, &payload.whatsapp)?;
    let now = Utc::now();
    let ttl = reservation_ttl(&state.config);

    let txn = state.orm.begin().await?;
    let session = find_session(&txn, token)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;
    let items = CartItems::find()
        .filter(CartCol::SessionId.eq(session.id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&txn)
        .await?;
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let codes: Vec<String> = items.iter().map(|item| item.sku.clone()).collect();
    let skus: HashMap<String, _> = Skus::find()
        .filter(SkuCol::Sku.is_in(codes))
        .all(&txn)
        .await?
        .into_iter()
        .map(|model| (model.sku.clone(), model))
        .collect();

    let mut results = Vec::with_capacity(items.len());
    let mut created = Vec::new();
    let mut promoted = Vec::new();

    for item in &items {
        let Some(sku) = skus.get(&item.sku) else {
            results.push(SubmitItemResult {
                cart_item_id: item.id,
                sku: item.sku.clone(),
                color: item.color.clone(),
                size: item.size.clone(),
                status: BookingStatus::Closed,
                order_id: None,
            });
            continue;
        };

        let outcome = book_slot(
            &txn,
            BookingRequest {
                sku,
                color: &item.color,
                size: &item.size,
                customer_name: &contact.name,
                whatsapp: &contact.whatsapp,
                quantity: item.quantity,
                cart_session_id: Some(session.id),
                cart_item: Some(item.id),
            },
            now,
            ttl,
        )
        .await?;

        results.push(SubmitItemResult {
            cart_item_id: item.id,
            sku: item.sku.clone(),
            color: item.color.clone(),
            size: item.size.clone(),
            status: outcome.status,
            order_id: outcome.order.as_ref().map(|o| o.id),
        });
        if matches!(outcome.status, BookingStatus::Booked | BookingStatus::Waitlisted) {
            created.extend(outcome.order);
        }
        promoted.extend(outcome.promoted);
    }

    CartItems::delete_many()
        .filter(CartCol::SessionId.eq(session.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    publish_promotions(state, &promoted);
    for order in &created {
        state.events.publish(
            StoreEvent::new(EventKind::OrderCreated, order.id, order.sku.clone())
                .with_status(order.status.clone()),
        );
    }
    tracing::info!(
        session_id = %session.id,
        items = results.len(),
        orders = created.len(),
        "cart submitted"
    );
    audit::record(
        &state.pool,
        Some(contact.whatsapp.as_str()),
        "cart_submit",
        "orders",
        serde_json::json!({
            "session_id": session.id,
            "order_ids": created.iter().map(|o| o.id).collect::<Vec<_>>(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart submitted",
        SubmitCartResponse { results },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn cart_item(status: &str, expires_in_secs: i64, now: DateTime<Utc>) -> CartModel {
        CartModel {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            sku: "DRS-01".into(),
            color: "Red".into(),
            size: "M".into(),
            quantity: 2,
            status: status.into(),
            expires_at: (now + Duration::seconds(expires_in_secs)).into(),
            created_at: now.into(),
        }
    }

    #[test]
    fn generated_tokens_are_valid() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(CartToken::parse(&token).is_ok());
        assert_ne!(token, generate_token());
    }

    #[test]
    fn item_states() {
        let now = Utc::now();
        assert_eq!(item_state(&cart_item("reserved", 60, now), now), CartItemState::Reserved);
        assert_eq!(item_state(&cart_item("reserved", -1, now), now), CartItemState::Expired);
        assert_eq!(item_state(&cart_item("waitlist", -1, now), now), CartItemState::Waitlist);
    }

    #[test]
    fn subtotal_counts_live_reservations_only() {
        let now = Utc::now();
        let dress = Sku {
            sku: "DRS-01".into(),
            name: "Dress".into(),
            description: None,
            price: 1_000,
            images: vec!["https://cdn.example.com/drs.jpg".into()],
            colors: vec!["Red".into()],
            sizes: vec!["M".into()],
            video_url: None,
            deadline: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let views = vec![
            item_view(cart_item("reserved", 120, now), Some(&dress), now),
            item_view(cart_item("reserved", -5, now), Some(&dress), now),
            item_view(cart_item("waitlist", 120, now), Some(&dress), now),
        ];
        assert_eq!(views[0].seconds_remaining, 120);
        assert_eq!(views[0].image.as_deref(), Some("https://cdn.example.com/drs.jpg"));
        assert_eq!(views[1].seconds_remaining, 0);
        assert_eq!(subtotal(&views), 2_000);

        let orphan = item_view(cart_item("reserved", 60, now), None, now);
        assert_eq!(orphan.name, "DRS-01");
        assert_eq!(orphan.unit_price, 0);
    }
}
