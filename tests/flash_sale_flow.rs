mod common;

use chrono::{Datelike, Utc};
use common::{cart_states, database_url, new_cart, setup_state};
use flash_sale_storefront::{
    dto::{
        admin::{CreateSkuRequest, MonthlyQuery, RegistrationQuery, SlotQuotaRequest, UpdateOrderStatusRequest},
        cart::{AddToCartRequest, AddToCartStatus, CartItemState, SubmitCartRequest},
        reels::{BookingStatus, CreateReelsOrderRequest},
    },
    entity::{AuditLogs, audit_logs},
    error::AppError,
    middleware::{auth::AuthUser, cart_token::CartToken},
    models::OrderStatus,
    registrations::RegistrationView,
    services::{
        admin_service, analytics_service, cart_service, payment_service, reels_service,
        sku_service,
    },
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

const SKU: &str = "TST-01";

// Flow: one-unit slot booked, waitlisted and duplicated; admin void promotes
// the waitlist; cart reserve -> submit; payment summary; board and analytics.
#[tokio::test]
async fn reels_waitlist_cart_and_payment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let Some(database_url) = database_url() else {
        return Ok(());
    };

    let state = setup_state(&database_url).await?;
    let admin = AuthUser::admin();

    sku_service::create_sku(
        &state,
        &admin,
        CreateSkuRequest {
            sku: SKU.into(),
            name: "Test Dress".into(),
            description: None,
            price: 100_000,
            images: vec![],
            colors: vec!["Red".into()],
            sizes: vec!["M".into()],
            video_url: Some("https://example.com/reel".into()),
            deadline: None,
            is_active: Some(true),
            quota: Some(1),
        },
    )
    .await?;

    // Slot of one: first booking fits, second waits, repeat is a duplicate.
    let first = reels_order(&state, "Ani", "0812-3456-7890").await?;
    assert_eq!(first.status, BookingStatus::Booked);
    assert_eq!(first.order_status, Some(OrderStatus::Pending));
    assert_eq!(first.remaining, 0);
    let first_id = first.order_id.expect("order id");

    let second = reels_order(&state, "Budi", "081298765432").await?;
    assert_eq!(second.status, BookingStatus::Waitlisted);
    assert_eq!(second.order_status, Some(OrderStatus::Waitlist));
    let second_id = second.order_id.expect("order id");

    let again = reels_order(&state, "Ani", "+6281234567890").await?;
    assert_eq!(again.status, BookingStatus::Duplicate);
    assert_eq!(again.order_id, Some(first_id));

    // Voiding the booked order frees the slot for the waitlist.
    set_status(&state, &admin, first_id, OrderStatus::Void).await?;
    let promoted = admin_service::get_order(&state, &admin, second_id)
        .await?
        .data
        .expect("order");
    assert_eq!(promoted.status, OrderStatus::Pending);

    let invalid = set_status(&state, &admin, first_id, OrderStatus::Pending).await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    // Payment summary is keyed by the WhatsApp number in any format.
    let summary = payment_service::get_order_payment_summary(&state, second_id, "+62 812 9876 5432")
        .await?
        .data
        .expect("summary");
    assert_eq!(summary.amount_due, 100_000);
    assert!(summary.can_submit_proof);
    assert!(!summary.proof_submitted);
    let wrong = payment_service::get_order_payment_summary(&state, second_id, "081234567890").await;
    assert!(matches!(wrong, Err(AppError::NotFound)));

    // Second unit for the cart flow.
    let slot = sku_service::set_slot_quota(
        &state,
        &admin,
        SKU,
        SlotQuotaRequest {
            color: "Red".into(),
            size: "M".into(),
            quota: 2,
        },
    )
    .await?
    .data
    .expect("slot");
    assert_eq!(slot.remaining, 1);

    let token = new_cart(&state).await?;
    let added = add_one(&state, &token).await?;
    assert_eq!(added, AddToCartStatus::Reserved);

    let other = new_cart(&state).await?;
    assert_eq!(add_one(&state, &other).await?, AddToCartStatus::Waitlist);

    let cart = cart_service::get_cart(&state, &token).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.subtotal, 100_000);

    let submitted = cart_service::submit_cart_to_reels_order(
        &state,
        &token,
        SubmitCartRequest {
            name: "Citra".into(),
            whatsapp: "081111111111".into(),
        },
    )
    .await?
    .data
    .expect("results");
    assert_eq!(submitted.results.len(), 1);
    assert_eq!(submitted.results[0].status, BookingStatus::Booked);
    assert!(submitted.results[0].order_id.is_some());

    let emptied = cart_service::get_cart(&state, &token).await?.data.expect("cart");
    assert!(emptied.items.is_empty());
    let empty_submit = cart_service::submit_cart_to_reels_order(
        &state,
        &token,
        SubmitCartRequest {
            name: "Citra".into(),
            whatsapp: "081111111111".into(),
        },
    )
    .await;
    assert!(matches!(empty_submit, Err(AppError::BadRequest(_))));

    // Board: three orders, void one hidden from the pending view.
    let board = admin_service::list_registrations(
        &state,
        &admin,
        RegistrationQuery {
            view: Some(RegistrationView::Pending),
            sku: Some("tst".into()),
        },
    )
    .await?
    .data
    .expect("board");
    assert_eq!(board.groups.len(), 1);
    assert_eq!(board.total, 2);
    assert_eq!(board.groups[0].sku, SKU);

    // A paid order counts as a sale.
    set_status(&state, &admin, second_id, OrderStatus::Paid).await?;
    let report = analytics_service::monthly(
        &state,
        &admin,
        MonthlyQuery {
            year: Some(Utc::now().year()),
        },
    )
    .await?
    .data
    .expect("report");
    assert_eq!(report.months.len(), 12);
    assert_eq!(report.total_amount, 100_000);
    assert_eq!(report.total_units, 1);

    let deleted = sku_service::delete_sku(&state, &admin, SKU).await;
    assert!(matches!(deleted, Err(AppError::BadRequest(_))));

    // Nothing has expired and the slot is full, so the waiting cart stays put.
    let report = admin_service::sweep_reservations(&state, &admin)
        .await?
        .data
        .expect("report");
    assert!(report.is_empty(), "unexpected sweep: {report:?}");
    assert_eq!(cart_states(&state, &other).await?, vec![CartItemState::Waitlist]);

    // Duplicates are not audited.
    let audited = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("reels_order_create"))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 2);

    Ok(())
}

async fn reels_order(
    state: &AppState,
    name: &str,
    whatsapp: &str,
) -> anyhow::Result<flash_sale_storefront::dto::reels::ReelsOrderResponse> {
    let resp = reels_service::create_reels_order_with_quota(
        state,
        CreateReelsOrderRequest {
            name: name.into(),
            whatsapp: whatsapp.into(),
            sku: SKU.into(),
            color: "Red".into(),
            size: "M".into(),
            quantity: None,
        },
    )
    .await?;
    Ok(resp.data.expect("booking"))
}

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    id: Uuid,
    status: OrderStatus,
) -> Result<(), AppError> {
    admin_service::update_order_status(state, admin, id, UpdateOrderStatusRequest { status }).await?;
    Ok(())
}

async fn add_one(state: &AppState, token: &CartToken) -> anyhow::Result<AddToCartStatus> {
    let resp = cart_service::add_to_cart(
        state,
        token,
        AddToCartRequest {
            sku: SKU.into(),
            color: "Red".into(),
            size: "M".into(),
            quantity: 1,
        },
    )
    .await?;
    Ok(resp.data.expect("cart item").status)
}
