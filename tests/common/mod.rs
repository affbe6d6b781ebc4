#![allow(dead_code)]

use flash_sale_storefront::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        admin::CreateSkuRequest,
        cart::{AddToCartRequest, AddToCartResponse, CartItemState},
        reels::{CreateReelsOrderRequest, ReelsOrderResponse},
    },
    middleware::{auth::AuthUser, cart_token::CartToken},
    services::{cart_service, reels_service, sku_service},
    state::AppState,
};
use sea_orm::{ConnectionTrait, Statement};
use uuid::Uuid;

/// `None` when no database is configured; callers skip the test.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, orders, cart_items, cart_sessions, inventory, skus CASCADE",
    ))
    .await?;

    let upload_dir = std::env::temp_dir().join(format!("flash-sale-storefront-{}", Uuid::new_v4()));
    let url = database_url.to_string();
    let config = AppConfig::from_lookup(move |key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("test-secret".into()),
        "ADMIN_PIN_HASH" => Some("unused".into()),
        "UPLOAD_DIR" => Some(upload_dir.display().to_string()),
        _ => None,
    })?;

    AppState::new(pool, orm, config)
}

/// One color "Red", one size "M".
pub async fn create_sku(state: &AppState, code: &str, quota: i32, active: bool) -> anyhow::Result<()> {
    sku_service::create_sku(
        state,
        &AuthUser::admin(),
        CreateSkuRequest {
            sku: code.into(),
            name: format!("Item {code}"),
            description: None,
            price: 150_000,
            images: vec![],
            colors: vec!["Red".into()],
            sizes: vec!["M".into()],
            video_url: None,
            deadline: None,
            is_active: Some(active),
            quota: Some(quota),
        },
    )
    .await?;
    Ok(())
}

pub async fn new_cart(state: &AppState) -> anyhow::Result<CartToken> {
    let session = cart_service::create_session(state).await?.data.expect("session");
    Ok(CartToken::parse(&session.token)?)
}

pub async fn add_item(
    state: &AppState,
    token: &CartToken,
    sku: &str,
    color: &str,
) -> anyhow::Result<AddToCartResponse> {
    let resp = cart_service::add_to_cart(
        state,
        token,
        AddToCartRequest {
            sku: sku.into(),
            color: color.into(),
            size: "M".into(),
            quantity: 1,
        },
    )
    .await?;
    Ok(resp.data.expect("cart item"))
}

pub async fn reels_order(
    state: &AppState,
    sku: &str,
    color: &str,
    name: &str,
    whatsapp: &str,
) -> anyhow::Result<ReelsOrderResponse> {
    let resp = reels_service::create_reels_order_with_quota(
        state,
        CreateReelsOrderRequest {
            name: name.into(),
            whatsapp: whatsapp.into(),
            sku: sku.into(),
            color: color.into(),
            size: "M".into(),
            quantity: None,
        },
    )
    .await?;
    Ok(resp.data.expect("booking"))
}

/// Push a reservation's expiry into the past.
pub async fn expire_cart_item(state: &AppState, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE cart_items SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    Ok(())
}

pub async fn cart_states(state: &AppState, token: &CartToken) -> anyhow::Result<Vec<CartItemState>> {
    let cart = cart_service::get_cart(state, token).await?.data.expect("cart");
    Ok(cart.items.iter().map(|item| item.state).collect())
}
