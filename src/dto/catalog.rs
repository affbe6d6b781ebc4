use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Sku, Slot};

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SkuList {
    #[schema(value_type = Vec<Sku>)]
    pub items: Vec<Sku>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SkuDetail {
    pub sku: Sku,
    pub slots: Vec<Slot>,
    /// Units still bookable across all slots.
    pub remaining: i64,
    pub is_open: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedEntry {
    pub sku: Sku,
    pub slots: Vec<Slot>,
    pub remaining: i64,
    pub is_sold_out: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FeedList {
    #[schema(value_type = Vec<FeedEntry>)]
    pub items: Vec<FeedEntry>,
}
