mod common;

use common::{add_item, create_sku, database_url, new_cart, reels_order, setup_state};
use flash_sale_storefront::{
    dto::{
        admin::SkuUpdate, cart::AddToCartStatus, payments::ProofUpload, reels::BookingStatus,
    },
    entity::{CartItems, Inventory, Orders, cart_items, inventory, orders},
    error::AppError,
    middleware::auth::AuthUser,
    models::OrderStatus,
    services::{admin_service, payment_service, sku_service},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

const BOOKED_WA: &str = "081300000001";
const WAITING_WA: &str = "081300000002";

#[tokio::test]
async fn invoice_proof_and_sku_rename() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&database_url).await?;
    let admin = AuthUser::admin();

    create_sku(&state, "INV-01", 1, true).await?;
    let booked = reels_order(&state, "INV-01", "Red", "Fajar", BOOKED_WA).await?;
    assert_eq!(booked.status, BookingStatus::Booked);
    let booked_id = booked.order_id.expect("order id");
    let waiting = reels_order(&state, "INV-01", "Red", "Gita", WAITING_WA).await?;
    assert_eq!(waiting.status, BookingStatus::Waitlisted);
    let waiting_id = waiting.order_id.expect("order id");

    // Invoice confirms a pending order and is written below the upload dir.
    let invoiced = admin_service::attach_invoice(&state, &admin, booked_id)
        .await?
        .data
        .expect("order");
    assert_eq!(invoiced.status, OrderStatus::Confirmed);
    let invoice_url = invoiced.invoice_url.expect("invoice url");
    assert!(invoice_url.ends_with(&format!("/uploads/invoices/{booked_id}.svg")));
    let svg = std::fs::read_to_string(
        state
            .config
            .upload_dir
            .join(format!("invoices/{booked_id}.svg")),
    )?;
    assert!(svg.starts_with("<svg"));

    let refused = admin_service::attach_invoice(&state, &admin, waiting_id).await;
    assert!(matches!(refused, Err(AppError::BadRequest(_))));

    // Payment proof moves the confirmed order to paid.
    let proof = || ProofUpload {
        content_type: "image/gif".into(),
        bytes: b"GIF89a".to_vec(),
    };
    let paid = payment_service::submit_payment_proof(&state, booked_id, "+62 813 0000 0001", proof())
        .await?
        .data
        .expect("order");
    assert_eq!(paid.status, OrderStatus::Paid);
    assert!(paid.payment_proof_url.as_deref().is_some_and(|url| url.ends_with(".gif")));

    let summary = payment_service::get_order_payment_summary(&state, booked_id, BOOKED_WA)
        .await?
        .data
        .expect("summary");
    assert!(summary.proof_submitted);

    let on_waitlist = payment_service::submit_payment_proof(&state, waiting_id, WAITING_WA, proof()).await;
    assert!(matches!(on_waitlist, Err(AppError::BadRequest(_))));
    let wrong_contact = payment_service::submit_payment_proof(&state, booked_id, WAITING_WA, proof()).await;
    assert!(matches!(wrong_contact, Err(AppError::NotFound)));
    let not_an_image = payment_service::submit_payment_proof(
        &state,
        booked_id,
        BOOKED_WA,
        ProofUpload {
            content_type: "image/svg+xml".into(),
            bytes: b"<svg/>".to_vec(),
        },
    )
    .await;
    assert!(matches!(not_an_image, Err(AppError::BadRequest(_))));

    // Renaming the code carries slots, orders and cart items along.
    let cart = new_cart(&state).await?;
    assert_eq!(add_item(&state, &cart, "INV-01", "Red").await?.status, AddToCartStatus::Waitlist);

    let renamed = sku_service::update_sku(
        &state,
        &admin,
        "INV-01",
        SkuUpdate {
            sku: Some("INV-02".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("sku");
    assert_eq!(renamed.sku, "INV-02");

    let slots = |code: &'static str| {
        Inventory::find()
            .filter(inventory::Column::Sku.eq(code))
            .count(&state.orm)
    };
    assert_eq!(slots("INV-01").await?, 0);
    assert_eq!(slots("INV-02").await?, 1);

    let moved_orders = Orders::find()
        .filter(orders::Column::Sku.eq("INV-02"))
        .count(&state.orm)
        .await?;
    assert_eq!(moved_orders, 2);
    let moved_items = CartItems::find()
        .filter(cart_items::Column::Sku.eq("INV-02"))
        .count(&state.orm)
        .await?;
    assert_eq!(moved_items, 1);

    let old = sku_service::get_sku(&state, &admin, "INV-01").await;
    assert!(matches!(old, Err(AppError::NotFound)));

    Ok(())
}
