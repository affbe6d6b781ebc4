use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tokio::fs;
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{OrderList, RegistrationBoard, RegistrationQuery, SweepReport, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    events::{EventKind, StoreEvent},
    invoice::{InvoiceData, render_svg},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus},
    registrations::{filter_registrations, group_and_sort_registrations},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        convert::{order_from_entity, orders_from_entities},
        reservation_service::{
            lock_slot, promote_waitlist, publish_promotions, reservation_ttl,
            sweep_expired_reservations, used_units,
        },
    },
    state::AppState,
};

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(sku) = query.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Sku.eq(sku));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = orders_from_entities(
        finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&state.orm)
            .await?,
    )?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Order found",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_registrations(
    state: &AppState,
    user: &AuthUser,
    query: RegistrationQuery,
) -> AppResult<ApiResponse<RegistrationBoard>> {
    ensure_admin(user)?;
    let orders = orders_from_entities(
        Orders::find()
            .order_by_desc(OrderCol::CreatedAt)
            .all(&state.orm)
            .await?,
    )?;

    let filtered = filter_registrations(
        orders,
        query.view.unwrap_or_default(),
        query.sku.as_deref(),
    );
    let total = filtered.len();
    let groups = group_and_sort_registrations(filtered)
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        "Registrations",
        RegistrationBoard { groups, total },
        Some(Meta::count(total)),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let next = payload.status;

    // The slot is locked before the order, same as every booking path.
    let existing = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let slot = lock_slot(&txn, &existing.sku, &existing.color, &existing.size).await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = parse_status(&order.status)?;
    if current == next {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Order unchanged",
            order_from_entity(order)?,
            Some(Meta::empty()),
        ));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {current} to {next}"
        )));
    }

    if !current.consumes_quota() && next.consumes_quota() {
        let slot = slot
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("slot no longer exists".into()))?;
        let used = used_units(&txn, &slot.sku, &slot.color, &slot.size, now, None).await?;
        if used + i64::from(order.quantity) > i64::from(slot.quota) {
            return Err(AppError::BadRequest("slot is full".into()));
        }
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    let promoted = match slot {
        Some(slot) if current.consumes_quota() && !next.consumes_quota() => {
            promote_waitlist(&txn, &slot, now, reservation_ttl(&state.config)).await?
        }
        _ => Default::default(),
    };
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %current, to = %next, "order status updated");
    state.events.publish(
        StoreEvent::new(EventKind::OrderUpdated, order.id, order.sku.clone())
            .with_status(next.as_str()),
    );
    publish_promotions(state, &promoted.orders);
    if promoted.cart_items > 0 {
        state
            .events
            .publish(StoreEvent::new(EventKind::CartUpdated, order.id, order.sku.clone()));
    }

    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "from": current.as_str(),
            "status": next.as_str(),
            "promoted": promoted.orders.iter().map(|o| o.id).collect::<Vec<_>>(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Render the order's invoice, store it under `uploads/invoices/` and
/// move a pending order to `confirmed`.
pub async fn attach_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = parse_status(&order.status)?;
    if matches!(
        current,
        OrderStatus::Waitlist | OrderStatus::OutOfStock | OrderStatus::Void
    ) {
        return Err(AppError::BadRequest(format!(
            "no invoice for a {current} order"
        )));
    }

    let svg = render_svg(&InvoiceData {
        store_name: &state.config.store_name,
        sku: &order.sku,
        customer_name: &order.customer_name,
        variation: Some(format!("{} / {}", order.color, order.size)),
        quantity: order.quantity,
        unit_price: order.price,
        issued_at: now,
    });

    let relative = format!("invoices/{}.svg", order.id);
    let path = state.config.upload_dir.join(&relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, svg).await?;

    let next = if current == OrderStatus::Pending {
        OrderStatus::Confirmed
    } else {
        current
    };

    let mut active: OrderActive = order.into();
    active.invoice_url = Set(Some(state.config.upload_url(&relative)));
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, status = %next, "invoice attached");
    state.events.publish(
        StoreEvent::new(EventKind::OrderUpdated, order.id, order.sku.clone())
            .with_status(next.as_str()),
    );
    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "invoice_attach",
        "orders",
        serde_json::json!({ "order_id": order.id, "file": relative }),
    )
    .await;

    Ok(ApiResponse::success(
        "Invoice attached",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn sweep_reservations(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SweepReport>> {
    ensure_admin(user)?;
    let report = sweep_expired_reservations(state).await?;
    tracing::info!(
        released = report.released,
        promoted_orders = report.promoted_orders,
        promoted_cart_items = report.promoted_cart_items,
        pruned_sessions = report.pruned_sessions,
        "manual sweep finished"
    );
    Ok(ApiResponse::success("Sweep finished", report, Some(Meta::empty())))
}
