use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    analytics::{MonthlyTotal, TrendPoint},
    models::{Order, OrderStatus},
    registrations::{RegistrationGroup, RegistrationView},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegistrationQuery {
    pub view: Option<RegistrationView>,
    pub sku: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationGroupDto {
    pub sku: String,
    pub latest_at: DateTime<Utc>,
    pub count: usize,
    pub items: Vec<Order>,
}

impl From<RegistrationGroup<Order>> for RegistrationGroupDto {
    fn from(group: RegistrationGroup<Order>) -> Self {
        Self {
            sku: group.sku,
            latest_at: group.latest_at,
            count: group.items.len(),
            items: group.items,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationBoard {
    pub groups: Vec<RegistrationGroupDto>,
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSkuRequest {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub video_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    /// Quota of every slot; the configured default when absent.
    pub quota: Option<i32>,
}

/// Partial SKU update. `sku` renames the code.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SkuUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub images: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    /// Empty string clears it.
    pub video_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_deadline: bool,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkuUpdateRequest {
    pub original_sku: String,
    pub update: SkuUpdate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SlotQuotaRequest {
    pub color: String,
    pub size: String,
    pub quota: i32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SweepReport {
    pub released: u64,
    pub promoted_orders: usize,
    pub promoted_cart_items: usize,
    /// Idle cart sessions without items that were deleted.
    pub pruned_sessions: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.released == 0
            && self.promoted_orders == 0
            && self.promoted_cart_items == 0
            && self.pruned_sessions == 0
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthlyQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrendQuery {
    pub sku: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyReport {
    pub year: i32,
    pub months: Vec<MonthlyTotal>,
    pub total_amount: i64,
    pub total_units: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendReport {
    pub sku: String,
    pub points: Vec<TrendPoint>,
}
