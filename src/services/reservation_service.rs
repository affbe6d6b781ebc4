//! Slot quota accounting, bookings and waitlist promotion.
//!
//! Every decision that reads a slot's remaining capacity first locks the
//! slot's `inventory` row (`FOR UPDATE`), so concurrent bookings,
//! reservations and promotions against one slot are serialised.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{LockType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::{admin::SweepReport, reels::BookingStatus},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        cart_sessions::{Column as SessionCol, Entity as CartSessions},
        inventory::{Column as InvCol, Entity as Inventory, Model as SlotModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        skus::Model as SkuModel,
    },
    error::AppResult,
    events::{EventKind, StoreEvent},
    models::{CartItemStatus, OrderStatus, Slot},
    services::convert::sku_from_entity,
    state::AppState,
};

type SlotKey = (String, String, String);

pub fn reservation_ttl(config: &AppConfig) -> Duration {
    Duration::from_std(config.reservation_ttl).unwrap_or_else(|_| Duration::minutes(15))
}

/// Lock and return the inventory row of one slot.
pub async fn lock_slot<C: ConnectionTrait>(
    conn: &C,
    sku: &str,
    color: &str,
    size: &str,
) -> AppResult<Option<SlotModel>> {
    let slot = Inventory::find()
        .filter(InvCol::Sku.eq(sku))
        .filter(InvCol::Color.eq(color))
        .filter(InvCol::Size.eq(size))
        .lock(LockType::Update)
        .one(conn)
        .await?;
    Ok(slot)
}

/// Units of a slot held by quota-consuming orders and live reservations.
pub async fn used_units<C: ConnectionTrait>(
    conn: &C,
    sku: &str,
    color: &str,
    size: &str,
    now: DateTime<Utc>,
    exclude_cart_item: Option<Uuid>,
) -> AppResult<i64> {
    let booked: i64 = Orders::find()
        .filter(OrderCol::Sku.eq(sku))
        .filter(OrderCol::Color.eq(color))
        .filter(OrderCol::Size.eq(size))
        .filter(OrderCol::Status.is_in(OrderStatus::quota_statuses()))
        .all(conn)
        .await?
        .iter()
        .map(|o| i64::from(o.quantity))
        .sum();

    let mut holds = CartItems::find()
        .filter(CartCol::Sku.eq(sku))
        .filter(CartCol::Color.eq(color))
        .filter(CartCol::Size.eq(size))
        .filter(CartCol::Status.eq(CartItemStatus::Reserved.as_str()))
        .filter(CartCol::ExpiresAt.gt(now));
    if let Some(id) = exclude_cart_item {
        holds = holds.filter(CartCol::Id.ne(id));
    }
    let held: i64 = holds
        .all(conn)
        .await?
        .iter()
        .map(|c| i64::from(c.quantity))
        .sum();

    Ok(booked + held)
}

/// Live availability of every slot of the given SKUs.
pub async fn availability<C: ConnectionTrait>(
    conn: &C,
    skus: &[String],
    now: DateTime<Utc>,
) -> AppResult<HashMap<String, Vec<Slot>>> {
    if skus.is_empty() {
        return Ok(HashMap::new());
    }

    let slots = Inventory::find()
        .filter(InvCol::Sku.is_in(skus.iter().cloned()))
        .order_by_asc(InvCol::CreatedAt)
        .order_by_asc(InvCol::Color)
        .order_by_asc(InvCol::Size)
        .all(conn)
        .await?;

    let mut used: HashMap<SlotKey, i64> = HashMap::new();

    let orders = Orders::find()
        .filter(OrderCol::Sku.is_in(skus.iter().cloned()))
        .filter(OrderCol::Status.is_in(OrderStatus::quota_statuses()))
        .all(conn)
        .await?;
    for order in orders {
        *used.entry((order.sku, order.color, order.size)).or_default() += i64::from(order.quantity);
    }

    let holds = CartItems::find()
        .filter(CartCol::Sku.is_in(skus.iter().cloned()))
        .filter(CartCol::Status.eq(CartItemStatus::Reserved.as_str()))
        .filter(CartCol::ExpiresAt.gt(now))
        .all(conn)
        .await?;
    for hold in holds {
        *used.entry((hold.sku, hold.color, hold.size)).or_default() += i64::from(hold.quantity);
    }

    let mut by_sku: HashMap<String, Vec<Slot>> = HashMap::new();
    for slot in slots {
        let key = (slot.sku.clone(), slot.color.clone(), slot.size.clone());
        let taken = used.get(&key).copied().unwrap_or(0);
        by_sku.entry(slot.sku).or_default().push(Slot {
            remaining: (i64::from(slot.quota) - taken).max(0),
            color: slot.color,
            size: slot.size,
            quota: slot.quota,
        });
    }

    Ok(by_sku)
}

pub fn total_remaining(slots: &[Slot]) -> i64 {
    slots.iter().map(|s| s.remaining).sum()
}

#[derive(Debug, Default)]
pub struct Promotion {
    pub orders: Vec<OrderModel>,
    pub cart_items: usize,
}

/// Move waitlisted orders, then waitlisted cart items, of a locked slot
/// into its free capacity, oldest first. Promotion stops at the first
/// entry that does not fit so nobody is overtaken.
///
/// A cart item that is being booked or re-added is promoted in its own
/// queue position like any other entry; callers then book it against
/// capacity that excludes its own hold.
pub async fn promote_waitlist<C: ConnectionTrait>(
    conn: &C,
    slot: &SlotModel,
    now: DateTime<Utc>,
    ttl: Duration,
) -> AppResult<Promotion> {
    let mut promotion = Promotion::default();
    let used = used_units(conn, &slot.sku, &slot.color, &slot.size, now, None).await?;
    let mut remaining = i64::from(slot.quota) - used;
    if remaining <= 0 {
        return Ok(promotion);
    }

    let waiting_orders = Orders::find()
        .filter(OrderCol::Sku.eq(slot.sku.as_str()))
        .filter(OrderCol::Color.eq(slot.color.as_str()))
        .filter(OrderCol::Size.eq(slot.size.as_str()))
        .filter(OrderCol::Status.eq(OrderStatus::Waitlist.as_str()))
        .order_by_asc(OrderCol::CreatedAt)
        .order_by_asc(OrderCol::Id)
        .all(conn)
        .await?;

    for order in waiting_orders {
        let quantity = i64::from(order.quantity);
        if quantity > remaining {
            return Ok(promotion);
        }
        remaining -= quantity;
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Pending.as_str().to_string());
        active.updated_at = Set(now.into());
        promotion.orders.push(active.update(conn).await?);
    }

    let waiting_items = CartItems::find()
        .filter(CartCol::Sku.eq(slot.sku.as_str()))
        .filter(CartCol::Color.eq(slot.color.as_str()))
        .filter(CartCol::Size.eq(slot.size.as_str()))
        .filter(CartCol::Status.eq(CartItemStatus::Waitlist.as_str()))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .all(conn)
        .await?;

    for item in waiting_items {
        let quantity = i64::from(item.quantity);
        if quantity > remaining {
            break;
        }
        remaining -= quantity;
        let mut active: CartActive = item.into();
        active.status = Set(CartItemStatus::Reserved.as_str().to_string());
        active.expires_at = Set((now + ttl).into());
        active.update(conn).await?;
        promotion.cart_items += 1;
    }

    Ok(promotion)
}

pub struct BookingRequest<'a> {
    pub sku: &'a SkuModel,
    pub color: &'a str,
    pub size: &'a str,
    pub customer_name: &'a str,
    /// Already normalised.
    pub whatsapp: &'a str,
    pub quantity: i32,
    pub cart_session_id: Option<Uuid>,
    /// Cart item being converted. It keeps its waitlist position and its
    /// own hold is not counted against it.
    pub cart_item: Option<Uuid>,
}

#[derive(Debug)]
pub struct BookingOutcome {
    pub status: BookingStatus,
    pub order: Option<OrderModel>,
    pub remaining: i64,
    pub promoted: Vec<OrderModel>,
}

impl BookingOutcome {
    fn rejected(status: BookingStatus) -> Self {
        Self {
            status,
            order: None,
            remaining: 0,
            promoted: Vec::new(),
        }
    }
}

/// Book one slot for a customer: `pending` within quota, `waitlist`
/// beyond it. At most one live booking per WhatsApp number and slot.
pub async fn book_slot<C: ConnectionTrait>(
    conn: &C,
    req: BookingRequest<'_>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> AppResult<BookingOutcome> {
    if !sku_from_entity(req.sku.clone()).is_open(now) {
        return Ok(BookingOutcome::rejected(BookingStatus::Closed));
    }

    let Some(slot) = lock_slot(conn, &req.sku.sku, req.color, req.size).await? else {
        return Ok(BookingOutcome::rejected(BookingStatus::InvalidVariation));
    };

    let duplicate = Orders::find()
        .filter(OrderCol::Sku.eq(slot.sku.as_str()))
        .filter(OrderCol::Color.eq(slot.color.as_str()))
        .filter(OrderCol::Size.eq(slot.size.as_str()))
        .filter(OrderCol::Whatsapp.eq(req.whatsapp))
        .filter(
            OrderCol::Status.is_not_in([
                OrderStatus::Void.as_str(),
                OrderStatus::OutOfStock.as_str(),
            ]),
        )
        .one(conn)
        .await?;

    let promoted = promote_waitlist(conn, &slot, now, ttl).await?.orders;

    let quota = i64::from(slot.quota);
    let used = used_units(conn, &slot.sku, &slot.color, &slot.size, now, req.cart_item).await?;

    if let Some(existing) = duplicate {
        return Ok(BookingOutcome {
            status: BookingStatus::Duplicate,
            order: Some(existing),
            remaining: (quota - used).max(0),
            promoted,
        });
    }

    let quantity = i64::from(req.quantity);
    let fits = used + quantity <= quota;
    let (status, order_status) = if fits {
        (BookingStatus::Booked, OrderStatus::Pending)
    } else {
        (BookingStatus::Waitlisted, OrderStatus::Waitlist)
    };

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        sku: Set(slot.sku.clone()),
        customer_name: Set(req.customer_name.to_string()),
        whatsapp: Set(req.whatsapp.to_string()),
        color: Set(slot.color.clone()),
        size: Set(slot.size.clone()),
        quantity: Set(req.quantity),
        price: Set(req.sku.price),
        status: Set(order_status.as_str().to_string()),
        payment_proof_url: Set(None),
        invoice_url: Set(None),
        cart_session_id: Set(req.cart_session_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    let remaining = if fits { quota - used - quantity } else { quota - used };

    Ok(BookingOutcome {
        status,
        order: Some(order),
        remaining: remaining.max(0),
        promoted,
    })
}

pub fn publish_promotions(state: &AppState, promoted: &[OrderModel]) {
    for order in promoted {
        tracing::info!(order_id = %order.id, sku = %order.sku, "waitlist order promoted");
        state.events.publish(
            StoreEvent::new(EventKind::OrderUpdated, order.id, order.sku.clone())
                .with_status(OrderStatus::Pending.as_str()),
        );
    }
}

/// Release expired reservations and refill freed slots from their
/// waitlists. Also picks up slots whose capacity grew since the last run,
/// and drops idle cart sessions that hold no items.
pub async fn sweep_expired_reservations(state: &AppState) -> AppResult<SweepReport> {
    let now = Utc::now();
    let ttl = reservation_ttl(&state.config);
    let mut report = SweepReport::default();
    let mut slots: BTreeSet<SlotKey> = BTreeSet::new();

    let expired = CartItems::find()
        .filter(CartCol::Status.eq(CartItemStatus::Reserved.as_str()))
        .filter(CartCol::ExpiresAt.lte(now))
        .all(&state.orm)
        .await?;

    if !expired.is_empty() {
        let ids: Vec<Uuid> = expired.iter().map(|item| item.id).collect();
        report.released = release_expired(&state.orm, ids, now).await?;
        for item in expired {
            slots.insert((item.sku, item.color, item.size));
        }
    }

    let waiting_orders = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Waitlist.as_str()))
        .all(&state.orm)
        .await?;
    for order in waiting_orders {
        slots.insert((order.sku, order.color, order.size));
    }

    let waiting_items = CartItems::find()
        .filter(CartCol::Status.eq(CartItemStatus::Waitlist.as_str()))
        .all(&state.orm)
        .await?;
    for item in waiting_items {
        slots.insert((item.sku, item.color, item.size));
    }

    for (sku, color, size) in slots {
        let txn = state.orm.begin().await?;
        let Some(slot) = lock_slot(&txn, &sku, &color, &size).await? else {
            txn.commit().await?;
            continue;
        };
        let promotion = promote_waitlist(&txn, &slot, now, ttl).await?;
        txn.commit().await?;

        report.promoted_orders += promotion.orders.len();
        report.promoted_cart_items += promotion.cart_items;
        publish_promotions(state, &promotion.orders);
        if promotion.cart_items > 0 {
            state
                .events
                .publish(StoreEvent::new(EventKind::CartUpdated, slot.id, sku.clone()));
        }
    }

    if report.released > 0 {
        state
            .events
            .publish(StoreEvent::new(EventKind::CartUpdated, "sweep", String::new()));
    }

    report.pruned_sessions = prune_idle_sessions(&state.orm, now - idle_session_ttl(&state.config)).await?;

    Ok(report)
}

/// Delete the given cart items that are still expired reservations at
/// `now`. Items renewed or promoted since they were read are kept.
pub async fn release_expired<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.is_in(ids))
        .filter(CartCol::Status.eq(CartItemStatus::Reserved.as_str()))
        .filter(CartCol::ExpiresAt.lte(now))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

pub fn idle_session_ttl(config: &AppConfig) -> Duration {
    Duration::from_std(config.cart_session_idle).unwrap_or_else(|_| Duration::hours(24))
}

/// Delete sessions last seen before `cutoff` that hold no cart items.
/// Orders keep their rows; their `cart_session_id` is nulled by the FK.
pub async fn prune_idle_sessions<C: ConnectionTrait>(conn: &C, cutoff: DateTime<Utc>) -> AppResult<u64> {
    let result = CartSessions::delete_many()
        .filter(SessionCol::LastSeenAt.lt(cutoff))
        .filter(
            SessionCol::Id.not_in_subquery(
                Query::select()
                    .column(CartCol::SessionId)
                    .from(CartItems)
                    .to_owned(),
            ),
        )
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_remaining_over_slots() {
        let slots = vec![
            Slot {
                color: "Red".into(),
                size: "M".into(),
                quota: 5,
                remaining: 2,
            },
            Slot {
                color: "Red".into(),
                size: "L".into(),
                quota: 3,
                remaining: 0,
            },
        ];
        assert_eq!(total_remaining(&slots), 2);
        assert_eq!(total_remaining(&[]), 0);
    }
}
