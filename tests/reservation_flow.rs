mod common;

use chrono::Utc;
use common::{
    add_item, cart_states, create_sku, database_url, expire_cart_item, new_cart, reels_order,
    setup_state,
};
use flash_sale_storefront::{
    dto::{
        cart::{AddToCartStatus, CartItemState, SubmitCartRequest},
        reels::BookingStatus,
    },
    entity::{CartItems, CartSessions, cart_sessions},
    middleware::{auth::AuthUser, cart_token::CartToken},
    services::{admin_service, cart_service, reservation_service::release_expired},
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

// Scenarios share one database, so they run in sequence inside one test.
#[tokio::test]
async fn reservations_expire_and_waitlist_keeps_queue_order() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;

    queue_order_survives_submit(&state).await?;
    sweep_releases_and_promotes(&state).await?;
    expired_reservation_rebooks_on_submit(&state).await?;
    closed_and_unknown_variations(&state).await?;
    idle_empty_sessions_are_pruned(&state).await?;

    Ok(())
}

async fn submit(state: &AppState, token: &CartToken, whatsapp: &str) -> anyhow::Result<BookingStatus> {
    let resp = cart_service::submit_cart_to_reels_order(
        state,
        token,
        SubmitCartRequest {
            name: "Dewi".into(),
            whatsapp: whatsapp.into(),
        },
    )
    .await?;
    let results = resp.data.expect("results").results;
    assert_eq!(results.len(), 1);
    Ok(results[0].status)
}

/// One unit: A holds it, X then Y wait. A's hold lapses and X checks out
/// first; X must get the unit and Y must keep waiting.
async fn queue_order_survives_submit(state: &AppState) -> anyhow::Result<()> {
    create_sku(state, "FIFO-01", 1, true).await?;

    let a = new_cart(state).await?;
    let a_item = add_item(state, &a, "FIFO-01", "Red").await?;
    assert_eq!(a_item.status, AddToCartStatus::Reserved);
    let x = new_cart(state).await?;
    assert_eq!(add_item(state, &x, "FIFO-01", "Red").await?.status, AddToCartStatus::Waitlist);
    let y = new_cart(state).await?;
    assert_eq!(add_item(state, &y, "FIFO-01", "Red").await?.status, AddToCartStatus::Waitlist);

    expire_cart_item(state, a_item.cart_item_id.expect("item id")).await?;
    assert_eq!(cart_states(state, &a).await?, vec![CartItemState::Expired]);

    assert_eq!(submit(state, &x, "081200000001").await?, BookingStatus::Booked);
    assert_eq!(cart_states(state, &y).await?, vec![CartItemState::Waitlist]);

    // A's lapsed hold is re-checked against the quota X now holds.
    assert_eq!(submit(state, &a, "081200000002").await?, BookingStatus::Waitlisted);
    Ok(())
}

async fn sweep_releases_and_promotes(state: &AppState) -> anyhow::Result<()> {
    create_sku(state, "SWP-01", 1, true).await?;

    let holder = new_cart(state).await?;
    let held = add_item(state, &holder, "SWP-01", "Red").await?;
    let waiting = new_cart(state).await?;
    let queued = add_item(state, &waiting, "SWP-01", "Red").await?;
    assert_eq!(queued.status, AddToCartStatus::Waitlist);

    expire_cart_item(state, held.cart_item_id.expect("item id")).await?;
    let report = admin_service::sweep_reservations(state, &AuthUser::admin())
        .await?
        .data
        .expect("report");
    assert_eq!(report.released, 1);
    assert_eq!(report.promoted_orders, 0);
    assert_eq!(report.promoted_cart_items, 1);

    assert!(cart_states(state, &holder).await?.is_empty());
    let cart = cart_service::get_cart(state, &waiting).await?.data.expect("cart");
    assert_eq!(cart.items[0].state, CartItemState::Reserved);
    assert!(cart.items[0].seconds_remaining > 0);

    // A renewed reservation read as expired earlier must not be deleted.
    let queued_id = queued.cart_item_id.expect("item id");
    assert_eq!(release_expired(&state.orm, vec![queued_id], Utc::now()).await?, 0);
    assert!(CartItems::find_by_id(queued_id).one(&state.orm).await?.is_some());
    Ok(())
}

async fn expired_reservation_rebooks_on_submit(state: &AppState) -> anyhow::Result<()> {
    create_sku(state, "EXP-01", 1, true).await?;

    let cart = new_cart(state).await?;
    let item = add_item(state, &cart, "EXP-01", "Red").await?;
    expire_cart_item(state, item.cart_item_id.expect("item id")).await?;

    assert_eq!(submit(state, &cart, "081200000003").await?, BookingStatus::Booked);
    Ok(())
}

async fn closed_and_unknown_variations(state: &AppState) -> anyhow::Result<()> {
    create_sku(state, "CLS-01", 5, false).await?;
    let cart = new_cart(state).await?;

    let closed = add_item(state, &cart, "CLS-01", "Red").await?;
    assert_eq!(closed.status, AddToCartStatus::Closed);
    assert!(closed.cart_item_id.is_none());
    let closed = reels_order(state, "CLS-01", "Red", "Eka", "081200000004").await?;
    assert_eq!(closed.status, BookingStatus::Closed);
    assert!(closed.order_id.is_none());

    let unknown = add_item(state, &cart, "EXP-01", "Blue").await?;
    assert_eq!(unknown.status, AddToCartStatus::InvalidVariation);
    let unknown = reels_order(state, "EXP-01", "Blue", "Eka", "081200000004").await?;
    assert_eq!(unknown.status, BookingStatus::InvalidVariation);
    assert!(unknown.order_id.is_none());

    assert!(cart_states(state, &cart).await?.is_empty());
    Ok(())
}

async fn idle_empty_sessions_are_pruned(state: &AppState) -> anyhow::Result<()> {
    let empty = new_cart(state).await?;
    let stocked = new_cart(state).await?;
    assert_eq!(add_item(state, &stocked, "SWP-01", "Red").await?.status, AddToCartStatus::Waitlist);

    for token in [&empty, &stocked] {
        sqlx::query("UPDATE cart_sessions SET last_seen_at = NOW() - INTERVAL '48 hours' WHERE token = $1")
            .bind(token.as_str())
            .execute(&state.pool)
            .await?;
    }

    let report = admin_service::sweep_reservations(state, &AuthUser::admin())
        .await?
        .data
        .expect("report");
    assert_eq!(report.pruned_sessions, 1);

    assert!(!session_exists(state, &empty).await?);
    assert!(session_exists(state, &stocked).await?);
    Ok(())
}

async fn session_exists(state: &AppState, token: &CartToken) -> anyhow::Result<bool> {
    let session = CartSessions::find()
        .filter(cart_sessions::Column::Token.eq(token.as_str()))
        .one(&state.orm)
        .await?;
    Ok(session.is_some())
}
