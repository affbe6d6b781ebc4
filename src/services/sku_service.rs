use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        admin::{CreateSkuRequest, SkuUpdate, SlotQuotaRequest},
        catalog::{SkuDetail, SkuList},
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        inventory::{ActiveModel as SlotActive, Column as InvCol, Entity as Inventory},
        orders::{Column as OrderCol, Entity as Orders},
        skus::{ActiveModel as SkuActive, Column as SkuCol, Entity as Skus, Model as SkuModel},
    },
    error::{AppError, AppResult},
    events::{EventKind, StoreEvent},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Sku, Slot},
    response::{Ack, ApiResponse, Meta},
    routes::params::CatalogQuery,
    services::{
        catalog_service,
        convert::{json_strings, sku_from_entity, strings_json},
        reservation_service::{lock_slot, promote_waitlist, publish_promotions, reservation_ttl, used_units},
    },
    state::AppState,
};

const MAX_CODE_LEN: usize = 64;

pub fn validate_sku_code(raw: &str) -> AppResult<String> {
    let code = raw.trim();
    if code.is_empty() || code.len() > MAX_CODE_LEN {
        return Err(AppError::BadRequest(format!(
            "SKU code must be 1..={MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "SKU code may only contain letters, digits, '-' and '_'".into(),
        ));
    }
    Ok(code.to_string())
}

/// Trim, drop blanks and duplicates; first occurrence wins.
pub fn clean_list(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect()
}

fn required_list(values: &[String], field: &str) -> AppResult<Vec<String>> {
    let cleaned = clean_list(values);
    if cleaned.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(cleaned)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_price(price: i64) -> AppResult<i64> {
    if price < 0 {
        return Err(AppError::BadRequest("price must not be negative".into()));
    }
    Ok(price)
}

fn validate_quota(quota: i32) -> AppResult<i32> {
    if quota < 0 {
        return Err(AppError::BadRequest("quota must not be negative".into()));
    }
    Ok(quota)
}

/// Make the SKU's slots match its colors × sizes. Missing slots are
/// created with `quota`; slots of removed variations are dropped along
/// with their cart holds. Orders keep their color/size snapshot.
async fn sync_slots<C: ConnectionTrait>(conn: &C, sku: &SkuModel, quota: i32) -> AppResult<()> {
    let now = Utc::now();
    let colors = json_strings(&sku.colors);
    let sizes = json_strings(&sku.sizes);
    let wanted: HashSet<(String, String)> = colors
        .iter()
        .flat_map(|c| sizes.iter().map(move |s| (c.clone(), s.clone())))
        .collect();

    let existing = Inventory::find()
        .filter(InvCol::Sku.eq(sku.sku.as_str()))
        .all(conn)
        .await?;
    let have: HashSet<(String, String)> = existing
        .iter()
        .map(|slot| (slot.color.clone(), slot.size.clone()))
        .collect();

    for slot in existing.iter().filter(|s| !wanted.contains(&(s.color.clone(), s.size.clone()))) {
        CartItems::delete_many()
            .filter(CartCol::Sku.eq(slot.sku.as_str()))
            .filter(CartCol::Color.eq(slot.color.as_str()))
            .filter(CartCol::Size.eq(slot.size.as_str()))
            .exec(conn)
            .await?;
        Inventory::delete_by_id(slot.id).exec(conn).await?;
    }

    for color in &colors {
        for size in &sizes {
            if have.contains(&(color.clone(), size.clone())) {
                continue;
            }
            SlotActive {
                id: Set(Uuid::new_v4()),
                sku: Set(sku.sku.clone()),
                color: Set(color.clone()),
                size: Set(size.clone()),
                quota: Set(quota),
                created_at: Set(now.into()),
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(())
}

pub async fn list_skus(
    state: &AppState,
    user: &AuthUser,
    query: CatalogQuery,
) -> AppResult<ApiResponse<SkuList>> {
    ensure_admin(user)?;
    catalog_service::list_skus(state, query, true).await
}

pub async fn get_sku(
    state: &AppState,
    user: &AuthUser,
    code: &str,
) -> AppResult<ApiResponse<SkuDetail>> {
    ensure_admin(user)?;
    catalog_service::get_sku(state, code, true).await
}

pub async fn create_sku(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSkuRequest,
) -> AppResult<ApiResponse<Sku>> {
    ensure_admin(user)?;
    let code = validate_sku_code(&payload.sku)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let price = validate_price(payload.price)?;
    let colors = required_list(&payload.colors, "colors")?;
    let sizes = required_list(&payload.sizes, "sizes")?;
    let quota = validate_quota(payload.quota.unwrap_or(state.config.default_quota))?;

    let txn = state.orm.begin().await?;
    if Skus::find_by_id(code.clone()).one(&txn).await?.is_some() {
        return Err(AppError::BadRequest("SKU code already exists".into()));
    }

    let now = Utc::now();
    let sku = SkuActive {
        sku: Set(code),
        name: Set(name),
        description: Set(blank_to_none(payload.description)),
        price: Set(price),
        images: Set(strings_json(&clean_list(&payload.images))),
        colors: Set(strings_json(&colors)),
        sizes: Set(strings_json(&sizes)),
        video_url: Set(blank_to_none(payload.video_url)),
        deadline: Set(payload.deadline.map(Into::into)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    sync_slots(&txn, &sku, quota).await?;
    txn.commit().await?;

    tracing::info!(sku = %sku.sku, quota, "sku created");
    state
        .events
        .publish(StoreEvent::new(EventKind::SkuUpdated, sku.sku.clone(), sku.sku.clone()));
    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "sku_create",
        "skus",
        serde_json::json!({ "sku": sku.sku, "quota": quota }),
    )
    .await;

    Ok(ApiResponse::success(
        "SKU created",
        sku_from_entity(sku),
        Some(Meta::empty()),
    ))
}

pub async fn update_sku(
    state: &AppState,
    user: &AuthUser,
    original_sku: &str,
    update: SkuUpdate,
) -> AppResult<ApiResponse<Sku>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = Skus::find_by_id(original_sku.trim().to_string())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut code = existing.sku.clone();
    if let Some(requested) = update.sku.as_deref() {
        let requested = validate_sku_code(requested)?;
        if requested != existing.sku {
            if Skus::find_by_id(requested.clone()).one(&txn).await?.is_some() {
                return Err(AppError::BadRequest("SKU code already exists".into()));
            }
            // inventory, orders and cart_items follow via ON UPDATE CASCADE.
            Skus::update_many()
                .col_expr(SkuCol::Sku, Expr::value(requested.clone()))
                .filter(SkuCol::Sku.eq(existing.sku.as_str()))
                .exec(&txn)
                .await?;
            code = requested;
        }
    }

    let current = Skus::find_by_id(code.clone())
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: SkuActive = current.into();

    if let Some(name) = update.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = update.description {
        active.description = Set(blank_to_none(Some(description)));
    }
    if let Some(price) = update.price {
        active.price = Set(validate_price(price)?);
    }
    if let Some(images) = update.images {
        active.images = Set(strings_json(&clean_list(&images)));
    }
    let variations_changed = update.colors.is_some() || update.sizes.is_some();
    if let Some(colors) = update.colors {
        active.colors = Set(strings_json(&required_list(&colors, "colors")?));
    }
    if let Some(sizes) = update.sizes {
        active.sizes = Set(strings_json(&required_list(&sizes, "sizes")?));
    }
    if let Some(video_url) = update.video_url {
        active.video_url = Set(blank_to_none(Some(video_url)));
    }
    if update.clear_deadline {
        active.deadline = Set(None);
    } else if let Some(deadline) = update.deadline {
        active.deadline = Set(Some(deadline.into()));
    }
    if let Some(is_active) = update.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let sku = active.update(&txn).await?;

    if variations_changed {
        sync_slots(&txn, &sku, state.config.default_quota).await?;
    }
    txn.commit().await?;

    tracing::info!(from = %original_sku, sku = %sku.sku, "sku updated");
    state
        .events
        .publish(StoreEvent::new(EventKind::SkuUpdated, sku.sku.clone(), sku.sku.clone()));
    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "sku_update",
        "skus",
        serde_json::json!({ "original_sku": original_sku, "sku": sku.sku }),
    )
    .await;

    Ok(ApiResponse::success(
        "SKU updated",
        sku_from_entity(sku),
        Some(Meta::empty()),
    ))
}

pub async fn delete_sku(
    state: &AppState,
    user: &AuthUser,
    code: &str,
) -> AppResult<ApiResponse<Ack>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let sku = Skus::find_by_id(code.to_string())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let orders = Orders::find()
        .filter(OrderCol::Sku.eq(sku.sku.as_str()))
        .count(&txn)
        .await?;
    if orders > 0 {
        return Err(AppError::BadRequest(format!(
            "SKU has {orders} orders and cannot be deleted"
        )));
    }

    // Slots and cart items go with it (ON DELETE CASCADE).
    Skus::delete_by_id(sku.sku.clone()).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(sku = %sku.sku, "sku deleted");
    state
        .events
        .publish(StoreEvent::new(EventKind::SkuUpdated, sku.sku.clone(), sku.sku.clone()));
    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "sku_delete",
        "skus",
        serde_json::json!({ "sku": sku.sku }),
    )
    .await;

    Ok(ApiResponse::success(
        "SKU deleted",
        Ack::new(sku.sku),
        Some(Meta::empty()),
    ))
}

/// Change one slot's quota. Raising it promotes waitlisted entries into
/// the new capacity right away.
pub async fn set_slot_quota(
    state: &AppState,
    user: &AuthUser,
    code: &str,
    payload: SlotQuotaRequest,
) -> AppResult<ApiResponse<Slot>> {
    ensure_admin(user)?;
    let quota = validate_quota(payload.quota)?;
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    let slot = lock_slot(&txn, code, payload.color.trim(), payload.size.trim())
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: SlotActive = slot.into();
    active.quota = Set(quota);
    let slot = active.update(&txn).await?;

    let promotion = promote_waitlist(&txn, &slot, now, reservation_ttl(&state.config)).await?;
    let used = used_units(&txn, &slot.sku, &slot.color, &slot.size, now, None).await?;
    txn.commit().await?;

    tracing::info!(
        sku = %slot.sku,
        color = %slot.color,
        size = %slot.size,
        quota,
        promoted = promotion.orders.len(),
        "slot quota updated"
    );
    publish_promotions(state, &promotion.orders);
    state
        .events
        .publish(StoreEvent::new(EventKind::SkuUpdated, slot.id, slot.sku.clone()));
    audit::record(
        &state.pool,
        Some(user.subject.as_str()),
        "slot_quota_update",
        "inventory",
        serde_json::json!({
            "sku": slot.sku,
            "color": slot.color,
            "size": slot.size,
            "quota": quota,
        }),
    )
    .await;

    let view = Slot {
        remaining: (i64::from(slot.quota) - used).max(0),
        color: slot.color,
        size: slot.size,
        quota: slot.quota,
    };
    Ok(ApiResponse::success("Slot updated", view, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_codes() {
        assert_eq!(validate_sku_code(" DRS-01 ").unwrap(), "DRS-01");
        assert!(validate_sku_code("top_2").is_ok());
        assert!(validate_sku_code("").is_err());
        assert!(validate_sku_code("has space").is_err());
        assert!(validate_sku_code("a/b").is_err());
        assert!(validate_sku_code(&"x".repeat(65)).is_err());
    }

    #[test]
    fn lists_are_trimmed_and_deduplicated() {
        let raw = vec![" Red".to_string(), "Blue".into(), "".into(), "Red ".into()];
        assert_eq!(clean_list(&raw), vec!["Red".to_string(), "Blue".to_string()]);
        assert!(required_list(&["  ".to_string()], "sizes").is_err());
    }

    #[test]
    fn blank_strings_clear_optional_fields() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" x ".into())), Some("x".into()));
        assert_eq!(blank_to_none(None), None);
    }
}
