use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use tokio::fs;
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::{BankInstructions, PaymentSummary, ProofUpload},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    events::{EventKind, StoreEvent},
    models::{OrderStatus, normalize_whatsapp},
    response::{ApiResponse, Meta},
    services::convert::order_from_entity,
    state::AppState,
};

pub const MAX_PROOF_BYTES: usize = 5 * 1024 * 1024;

/// Subtypes stored under a different extension than their name.
const EXTENSION_ALIASES: [(&str, &str); 3] = [("jpeg", "jpg"), ("pjpeg", "jpg"), ("x-png", "png")];

/// Extension a proof is stored with: any `image/*` except SVG, or PDF.
pub fn proof_extension(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if essence == "application/pdf" {
        return Some("pdf".to_string());
    }

    let subtype = essence.strip_prefix("image/")?;
    // SVG can carry script and is served back from /uploads.
    if subtype.is_empty() || subtype.starts_with("svg") || subtype.len() > 16 {
        return None;
    }
    if !subtype.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return None;
    }
    let ext = EXTENSION_ALIASES
        .iter()
        .find(|(name, _)| *name == subtype)
        .map_or(subtype, |(_, ext)| *ext);
    Some(ext.to_string())
}

pub fn accepts_proof(status: OrderStatus) -> bool {
    matches!(
        status,
        OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Paid
    )
}

/// Load an order on behalf of a customer; the WhatsApp number acts as
/// the shared secret, so a mismatch looks exactly like a missing order.
async fn order_for_contact<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    whatsapp: &str,
    lock: bool,
) -> AppResult<OrderModel> {
    let whatsapp = normalize_whatsapp(whatsapp).ok_or(AppError::NotFound)?;
    let mut finder = Orders::find_by_id(order_id);
    if lock {
        finder = finder.lock(LockType::Update);
    }
    finder
        .one(conn)
        .await?
        .filter(|order| order.whatsapp == whatsapp)
        .ok_or(AppError::NotFound)
}

pub async fn get_order_payment_summary(
    state: &AppState,
    order_id: Uuid,
    whatsapp: &str,
) -> AppResult<ApiResponse<PaymentSummary>> {
    let order = order_from_entity(order_for_contact(&state.orm, order_id, whatsapp, false).await?)?;
    let bank = &state.config.bank;

    let summary = PaymentSummary {
        amount_due: order.amount(),
        proof_submitted: order.payment_proof_url.is_some(),
        can_submit_proof: accepts_proof(order.status),
        bank: BankInstructions {
            bank_name: bank.bank_name.clone(),
            account_number: bank.account_number.clone(),
            account_holder: bank.account_holder.clone(),
        },
        order,
    };
    Ok(ApiResponse::success(
        "Payment summary",
        summary,
        Some(Meta::empty()),
    ))
}

pub async fn submit_payment_proof(
    state: &AppState,
    order_id: Uuid,
    whatsapp: &str,
    upload: ProofUpload,
) -> AppResult<ApiResponse<crate::models::Order>> {
    let ext = proof_extension(&upload.content_type).ok_or_else(|| {
        AppError::BadRequest("payment proof must be an image or PDF".into())
    })?;
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("payment proof is empty".into()));
    }
    if upload.bytes.len() > MAX_PROOF_BYTES {
        return Err(AppError::BadRequest("payment proof exceeds 5 MiB".into()));
    }

    let txn = state.orm.begin().await?;
    let order = order_for_contact(&txn, order_id, whatsapp, true).await?;
    let status: OrderStatus = order
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    if !accepts_proof(status) {
        return Err(AppError::BadRequest(format!(
            "order is {status} and cannot take a payment proof"
        )));
    }

    let now = Utc::now();
    let relative = format!(
        "payment-proofs/{}-{}.{ext}",
        order.id,
        now.format("%Y%m%d%H%M%S")
    );
    let path = state.config.upload_dir.join(&relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, &upload.bytes).await?;

    let mut active: OrderActive = order.into();
    active.payment_proof_url = Set(Some(state.config.upload_url(&relative)));
    active.status = Set(OrderStatus::Paid.as_str().to_string());
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, bytes = upload.bytes.len(), "payment proof stored");
    state.events.publish(
        StoreEvent::new(EventKind::OrderUpdated, order.id, order.sku.clone())
            .with_status(OrderStatus::Paid.as_str()),
    );
    audit::record(
        &state.pool,
        Some(order.whatsapp.as_str()),
        "payment_proof_submit",
        "orders",
        serde_json::json!({ "order_id": order.id, "file": relative }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment proof received",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_types() {
        assert_eq!(proof_extension("image/png").as_deref(), Some("png"));
        assert_eq!(proof_extension("IMAGE/JPEG").as_deref(), Some("jpg"));
        assert_eq!(proof_extension("image/gif").as_deref(), Some("gif"));
        assert_eq!(proof_extension("image/avif").as_deref(), Some("avif"));
        assert_eq!(proof_extension("image/heic").as_deref(), Some("heic"));
        assert_eq!(proof_extension("application/pdf; charset=binary").as_deref(), Some("pdf"));
        assert_eq!(proof_extension("image/svg+xml"), None);
        assert_eq!(proof_extension("image/../../etc"), None);
        assert_eq!(proof_extension("image/"), None);
        assert_eq!(proof_extension("text/html"), None);
        assert_eq!(proof_extension(""), None);
    }

    #[test]
    fn proof_only_for_open_bookings() {
        assert!(accepts_proof(OrderStatus::Pending));
        assert!(accepts_proof(OrderStatus::Confirmed));
        assert!(accepts_proof(OrderStatus::Paid));
        assert!(!accepts_proof(OrderStatus::Waitlist));
        assert!(!accepts_proof(OrderStatus::Void));
        assert!(!accepts_proof(OrderStatus::Verified));
    }
}
