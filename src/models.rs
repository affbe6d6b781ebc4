use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a flash-sale order.
///
/// `pending` → `confirmed` (invoice sent) → `paid` (proof uploaded) →
/// `verified` → `completed`. Orders past quota start in `waitlist` and
/// are promoted to `pending` when capacity frees up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    Verified,
    Completed,
    Void,
    Waitlist,
    OutOfStock,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Paid,
        OrderStatus::Verified,
        OrderStatus::Completed,
        OrderStatus::Void,
        OrderStatus::Waitlist,
        OrderStatus::OutOfStock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::Verified => "verified",
            OrderStatus::Completed => "completed",
            OrderStatus::Void => "void",
            OrderStatus::Waitlist => "waitlist",
            OrderStatus::OutOfStock => "out_of_stock",
        }
    }

    /// Statuses that hold a unit of the slot's quota.
    pub fn consumes_quota(self) -> bool {
        matches!(
            self,
            OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Paid
                | OrderStatus::Verified
                | OrderStatus::Completed
        )
    }

    /// Finished from the triage board's point of view.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Verified | OrderStatus::Void
        )
    }

    /// Counted as revenue by the analytics endpoints.
    pub fn is_sale(self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Verified | OrderStatus::Completed
        )
    }

    pub fn quota_statuses() -> Vec<&'static str> {
        Self::ALL
            .into_iter()
            .filter(|s| s.consumes_quota())
            .map(OrderStatus::as_str)
            .collect()
    }

    pub fn sale_statuses() -> Vec<&'static str> {
        Self::ALL
            .into_iter()
            .filter(|s| s.is_sale())
            .map(OrderStatus::as_str)
            .collect()
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            Pending => matches!(next, Confirmed | Paid | Void),
            Confirmed => matches!(next, Pending | Paid | Void),
            Paid => matches!(next, Confirmed | Verified | Void),
            Verified => matches!(next, Completed),
            Completed | Void => false,
            Waitlist => matches!(next, Pending | OutOfStock | Void),
            OutOfStock => matches!(next, Waitlist | Void),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status `{s}`"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CartItemStatus {
    Reserved,
    Waitlist,
}

impl CartItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CartItemStatus::Reserved => "reserved",
            CartItemStatus::Waitlist => "waitlist",
        }
    }
}

impl FromStr for CartItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(CartItemStatus::Reserved),
            "waitlist" => Ok(CartItemStatus::Waitlist),
            other => Err(format!("unknown cart item status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Sku {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub video_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sku {
    /// Whether new bookings are accepted at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.deadline.is_none_or(|deadline| deadline > now)
    }
}

/// One color × size inventory slot with its live availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub color: String,
    pub size: String,
    pub quota: i32,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub sku: String,
    pub customer_name: String,
    pub whatsapp: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub price: i64,
    pub status: OrderStatus,
    pub payment_proof_url: Option<String>,
    pub invoice_url: Option<String>,
    pub cart_session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn amount(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Normalise a WhatsApp number to international digits.
///
/// Spaces, dashes, dots and parentheses are ignored, a leading `+` is
/// dropped and a local leading `0` becomes the `62` country code.
pub fn normalize_whatsapp(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = String::with_capacity(without_plus.len());
    for c in without_plus.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }

    let digits = match digits.strip_prefix('0') {
        Some(rest) => format!("62{rest}"),
        None => digits,
    };

    (8..=15).contains(&digits.len()).then_some(digits)
}
